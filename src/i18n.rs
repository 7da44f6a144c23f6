// ==========================================
// 国际化 (i18n) 模块
// ==========================================
// 使用 rust-i18n 库
// 支持西班牙语（默认）和英文
// ==========================================
// 注意: rust_i18n::i18n! 宏已在 lib.rs 中初始化
// rust-i18n 的全局语言默认为 en，这里自行保存当前语言
// ==========================================

use std::sync::RwLock;

/// 默认语言
pub const DEFAULT_LOCALE: &str = "es";

// 空字符串表示未设置
static LOCALE: RwLock<String> = RwLock::new(String::new());

/// 获取当前语言
pub fn current_locale() -> String {
    match LOCALE.read() {
        Ok(locale) if !locale.is_empty() => locale.clone(),
        _ => DEFAULT_LOCALE.to_string(),
    }
}

/// 设置语言
///
/// # 参数
/// - locale: 语言代码（"es" 或 "en"）
pub fn set_locale(locale: &str) {
    rust_i18n::set_locale(locale);
    if let Ok(mut current) = LOCALE.write() {
        *current = locale.to_string();
    }
}

/// 已提供的语言
pub fn available_locales() -> Vec<String> {
    rust_i18n::available_locales!()
        .into_iter()
        .map(|l| l.to_string())
        .collect()
}

/// 翻译消息（无参数）
///
/// # 示例
/// ```no_run
/// use discount_planner::i18n::t;
/// let msg = t("mensajes.registro_exitoso");
/// ```
pub fn t(key: &str) -> String {
    let locale = current_locale();
    rust_i18n::t!(key, locale = locale.as_str()).to_string()
}

/// 翻译消息（带参数）
///
/// # 示例
/// ```no_run
/// use discount_planner::i18n::t_with_args;
/// let msg = t_with_args("validacion.fuera_de_rango", &[("min", "0"), ("max", "100")]);
/// ```
pub fn t_with_args(key: &str, args: &[(&str, &str)]) -> String {
    let locale = current_locale();
    let mut result = rust_i18n::t!(key, locale = locale.as_str()).to_string();
    for (k, v) in args {
        let placeholder = format!("%{{{}}}", k);
        result = result.replace(&placeholder, v);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // locale 为全局状态，测试默认并行执行，这里串行化
    static LOCALE_TEST_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn test_set_locale() {
        let _guard = LOCALE_TEST_LOCK.lock().unwrap();
        set_locale("es");
        assert_eq!(current_locale(), "es");

        set_locale("en");
        assert_eq!(current_locale(), "en");

        set_locale("es");
    }

    #[test]
    fn test_available_locales() {
        let locales = available_locales();
        assert!(locales.contains(&"es".to_string()));
        assert!(locales.contains(&"en".to_string()));
    }

    #[test]
    fn test_translate_simple() {
        let _guard = LOCALE_TEST_LOCK.lock().unwrap();
        set_locale("es");
        assert_eq!(t("common.success"), "Operación exitosa");
        assert_eq!(
            t("validacion.numero_invalido"),
            "Debe ingresar un número válido."
        );

        set_locale("en");
        assert_eq!(t("common.success"), "Operation successful");

        set_locale("es");
    }

    #[test]
    fn test_translate_with_args() {
        let _guard = LOCALE_TEST_LOCK.lock().unwrap();
        set_locale("es");
        let msg = t_with_args("validacion.fuera_de_rango", &[("min", "0"), ("max", "100")]);
        assert_eq!(msg, "Ingrese un número válido entre 0 y 100.");

        set_locale("en");
        let msg = t_with_args("importacion.archivo_no_encontrado", &[("path", "/tmp/x.csv")]);
        assert!(msg.contains("/tmp/x.csv"));
        assert!(msg.contains("File not found"));

        set_locale("es");
    }
}
