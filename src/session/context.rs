// ==========================================
// 折扣测算系统 - 会话上下文
// ==========================================
// 职责: 单用户会话的键值状态（JSON 值）
// 规则: init_if_absent 不覆盖已有值；reset_except 只保留指定键
// ==========================================

use crate::config::app_config::SessionKeysConfig;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct SessionContext {
    id: Uuid,
    created_at: DateTime<Utc>,
    store: BTreeMap<String, Value>,
}

impl Default for SessionContext {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionContext {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            store: BTreeMap::new(),
        }
    }

    /// 按配置写入初始键（已存在的键不覆盖）
    pub fn from_config(keys: &SessionKeysConfig) -> Self {
        let mut ctx = Self::new();
        for (key, initial) in &keys.inicializacion {
            ctx.init_if_absent(key, initial.valor_inicial.clone());
        }
        debug!(session_id = %ctx.id, keys = ctx.store.len(), "会话初始化");
        ctx
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// 键不存在时写入；返回是否写入
    pub fn init_if_absent(&mut self, key: &str, value: Value) -> bool {
        if self.store.contains_key(key) {
            return false;
        }
        self.store.insert(key.to_string(), value);
        true
    }

    pub fn set(&mut self, key: &str, value: Value) {
        self.store.insert(key.to_string(), value);
    }

    /// 序列化后写入
    pub fn set_as<T: Serialize>(&mut self, key: &str, value: &T) -> serde_json::Result<()> {
        let value = serde_json::to_value(value)?;
        self.set(key, value);
        Ok(())
    }

    pub fn set_many<'a>(&mut self, entries: impl IntoIterator<Item = (&'a str, Value)>) {
        for (key, value) in entries {
            self.set(key, value);
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.store.get(key)
    }

    /// 读取并反序列化；键不存在 → Ok(None)
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> serde_json::Result<Option<T>> {
        self.store
            .get(key)
            .map(|v| serde_json::from_value(v.clone()))
            .transpose()
    }

    /// 布尔标志；不存在或非布尔视为 false
    pub fn flag(&self, key: &str) -> bool {
        self.store.get(key).and_then(Value::as_bool).unwrap_or(false)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.store.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.store.keys().map(String::as_str)
    }

    pub fn remove_keys<S: AsRef<str>>(&mut self, keys: &[S]) {
        for key in keys {
            self.store.remove(key.as_ref());
        }
    }

    /// 删除除 preserved 之外的全部键
    pub fn reset_except<S: AsRef<str>>(&mut self, preserved: &[S]) {
        let keep: HashSet<&str> = preserved.iter().map(AsRef::as_ref).collect();
        let before = self.store.len();
        self.store.retain(|k, _| keep.contains(k.as_str()));
        debug!(
            session_id = %self.id,
            removed = before - self.store.len(),
            "会话状态重置"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::app_config::InitialValue;
    use serde_json::json;

    #[test]
    fn test_init_if_absent_does_not_overwrite() {
        let mut ctx = SessionContext::new();
        assert!(ctx.init_if_absent("archivos_cargados", json!(false)));
        ctx.set("archivos_cargados", json!(true));
        assert!(!ctx.init_if_absent("archivos_cargados", json!(false)));
        assert!(ctx.flag("archivos_cargados"));
    }

    #[test]
    fn test_reset_keeps_preserved_keys() {
        let mut ctx = SessionContext::new();
        ctx.set_many([
            ("list_materiales", json!([])),
            ("selector_material", json!("1001 : Arroz")),
            ("btn_confirmar_fechas", json!(true)),
        ]);

        ctx.reset_except(&["list_materiales"]);

        assert!(ctx.contains("list_materiales"));
        assert!(!ctx.contains("selector_material"));
        assert_eq!(ctx.keys().count(), 1);
    }

    #[test]
    fn test_typed_access() {
        let mut ctx = SessionContext::new();
        ctx.set_as("rango_valido", &(5u32, 10u32)).unwrap();
        let range: Option<(u32, u32)> = ctx.get_as("rango_valido").unwrap();
        assert_eq!(range, Some((5, 10)));

        let missing: Option<u32> = ctx.get_as("nada").unwrap();
        assert_eq!(missing, None);

        ctx.set("texto", json!("abc"));
        assert!(ctx.get_as::<u32>("texto").is_err());
    }

    #[test]
    fn test_from_config() {
        let mut keys = SessionKeysConfig::default();
        keys.inicializacion.insert(
            "registro_confirmado".to_string(),
            InitialValue {
                valor_inicial: json!(false),
            },
        );
        let ctx = SessionContext::from_config(&keys);
        assert_eq!(ctx.get("registro_confirmado"), Some(&json!(false)));
    }

    #[test]
    fn test_remove_keys() {
        let mut ctx = SessionContext::new();
        ctx.set("a", json!(1));
        ctx.set("b", json!(2));
        ctx.remove_keys(&["a", "zzz"]);
        assert!(!ctx.contains("a"));
        assert!(ctx.contains("b"));
    }
}
