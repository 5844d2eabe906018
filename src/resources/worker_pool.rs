use std::marker::PhantomData;

use super::common;
use super::{Mapping, ResourceError};
use crate::octopus::types::{Collection, WORKER_POOLS, WorkerPool};
use crate::terraform::schema::{Attribute, Schema, Validator};
use crate::terraform::value::Value;

const WORKER_TYPES: &[&str] = &[
    "UbuntuDefault",
    "WindowsDefault",
    "Ubuntu1804",
    "Ubuntu2204",
    "Windows2016",
    "Windows2019",
    "Windows2022",
];

pub trait WorkerPoolKind: Send + Sync + 'static {
    const TYPE_NAME: &'static str;
    const DISPLAY: &'static str;
    const WORKER_POOL_TYPE: &'static str;

    fn attributes() -> Vec<Attribute> {
        Vec::new()
    }

    fn expand_into(_value: &Value, _pool: &mut WorkerPool) {}

    fn flatten_into(_pool: &WorkerPool, _value: &mut Value) {}
}

pub struct WorkerPoolMapping<K>(PhantomData<fn() -> K>);

impl<K: WorkerPoolKind> Mapping for WorkerPoolMapping<K> {
    type Dto = WorkerPool;

    const TYPE_NAME: &'static str = K::TYPE_NAME;
    const DISPLAY: &'static str = K::DISPLAY;
    const COLLECTION: Collection = WORKER_POOLS;
    const PLURAL: &'static str = "worker_pools";
    const DATA_SOURCE: &'static str = "octopusdeploy_worker_pools";

    fn schema() -> Schema {
        let mut attributes = vec![
            common::id(),
            common::space_id(K::DISPLAY),
            common::name(K::DISPLAY),
            common::description(K::DISPLAY),
            Attribute::bool("is_default")
                .default(false)
                .description("Whether this is the default worker pool of the space."),
            common::sort_order(K::DISPLAY),
            Attribute::bool("can_add_workers").computed(),
        ];
        attributes.extend(K::attributes());
        Schema::new(format!("This resource manages {}s in Octopus Deploy.", K::DISPLAY), attributes)
    }

    fn expand(value: &Value) -> Result<WorkerPool, ResourceError> {
        let mut pool = WorkerPool {
            id: value.get_non_empty("id"),
            space_id: common::string_or_empty(value, "space_id"),
            name: common::string_or_empty(value, "name"),
            description: common::string_or_empty(value, "description"),
            worker_pool_type: K::WORKER_POOL_TYPE.to_string(),
            is_default: common::bool_or(value, "is_default", false),
            sort_order: common::int_or(value, "sort_order", 0),
            ..Default::default()
        };
        K::expand_into(value, &mut pool);
        Ok(pool)
    }

    fn flatten(pool: &WorkerPool) -> Value {
        let mut value = flatten_summary(pool);
        if let Value::Object(object) = &mut value {
            object.remove("worker_pool_type");
        }
        K::flatten_into(pool, &mut value);
        value
    }

    fn check(pool: &WorkerPool) -> Result<(), ResourceError> {
        if pool.worker_pool_type == K::WORKER_POOL_TYPE {
            return Ok(());
        }
        Err(ResourceError::UnexpectedKind {
            collection: WORKER_POOLS.path,
            id: pool.id.clone().unwrap_or_default(),
            field: "WorkerPoolType",
            actual: pool.worker_pool_type.clone(),
            expected: K::WORKER_POOL_TYPE,
        })
    }
}

pub(crate) fn summary_attributes() -> Vec<Attribute> {
    vec![
        Attribute::string("id"),
        Attribute::string("space_id"),
        Attribute::string("name"),
        Attribute::string("description"),
        Attribute::string("worker_pool_type"),
        Attribute::bool("is_default"),
        Attribute::int("sort_order"),
        Attribute::bool("can_add_workers"),
    ]
    .into_iter()
    .map(Attribute::into_computed)
    .collect()
}

pub(crate) fn flatten_summary(pool: &WorkerPool) -> Value {
    Value::object([
        ("id", Value::from(pool.id.clone())),
        ("space_id", Value::optional_string(&pool.space_id)),
        ("name", Value::from(&pool.name)),
        ("description", Value::optional_string(&pool.description)),
        ("worker_pool_type", Value::from(&pool.worker_pool_type)),
        ("is_default", Value::from(pool.is_default)),
        ("sort_order", Value::from(pool.sort_order)),
        ("can_add_workers", Value::from(pool.can_add_workers)),
    ])
}

pub struct StaticWorkerPool;

impl WorkerPoolKind for StaticWorkerPool {
    const TYPE_NAME: &'static str = "octopusdeploy_static_worker_pool";
    const DISPLAY: &'static str = "static worker pool";
    const WORKER_POOL_TYPE: &'static str = "StaticWorkerPool";
}

pub struct DynamicWorkerPool;

impl WorkerPoolKind for DynamicWorkerPool {
    const TYPE_NAME: &'static str = "octopusdeploy_dynamic_worker_pool";
    const DISPLAY: &'static str = "dynamic worker pool";
    const WORKER_POOL_TYPE: &'static str = "DynamicWorkerPool";

    fn attributes() -> Vec<Attribute> {
        vec![
            Attribute::string("worker_type")
                .required()
                .validate(Validator::OneOf(WORKER_TYPES))
                .description("The worker type of this dynamic worker pool."),
        ]
    }

    fn expand_into(value: &Value, pool: &mut WorkerPool) {
        pool.worker_type = value.get_non_empty("worker_type");
    }

    fn flatten_into(pool: &WorkerPool, value: &mut Value) {
        value.set("worker_type", Value::from(pool.worker_type.clone()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dynamic_pool_requires_worker_type() {
        let schema = WorkerPoolMapping::<DynamicWorkerPool>::schema();
        assert!(schema.attribute("worker_type").unwrap().required);
        assert!(WorkerPoolMapping::<StaticWorkerPool>::schema().attribute("worker_type").is_none());
    }

    #[test]
    fn test_expand_dynamic_pool() {
        let planned = Value::object([
            ("name", Value::from("Hosted Ubuntu")),
            ("worker_type", Value::from("Ubuntu2204")),
            ("sort_order", Value::Unknown),
        ]);
        let json = serde_json::to_value(WorkerPoolMapping::<DynamicWorkerPool>::expand(&planned).unwrap()).unwrap();
        assert_eq!(json["WorkerPoolType"], "DynamicWorkerPool");
        assert_eq!(json["WorkerType"], "Ubuntu2204");
    }

    #[test]
    fn test_static_pool_flatten_and_check() {
        let pool: WorkerPool = serde_json::from_value(serde_json::json!({
            "Id": "WorkerPools-1",
            "Name": "Default Worker Pool",
            "WorkerPoolType": "StaticWorkerPool",
            "IsDefault": true,
            "SortOrder": 1,
            "CanAddWorkers": true
        }))
        .unwrap();
        assert!(WorkerPoolMapping::<StaticWorkerPool>::check(&pool).is_ok());
        assert!(WorkerPoolMapping::<DynamicWorkerPool>::check(&pool).is_err());
        let value = WorkerPoolMapping::<StaticWorkerPool>::flatten(&pool);
        assert_eq!(value.get_bool("is_default"), Some(true));
        assert_eq!(value.get_bool("can_add_workers"), Some(true));
        assert!(value.get("worker_pool_type").is_null());
    }
}
