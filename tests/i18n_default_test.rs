// ==========================================
// 默认语言测试
// ==========================================
// 独立测试二进制: 进程内从未调用 set_locale
// ==========================================

use std::sync::Arc;

use discount_planner::config::{AppConfig, ConfigManager};
use discount_planner::i18n;
use discount_planner::DiscountApi;

#[test]
fn test_messages_default_to_spanish() {
    assert_eq!(i18n::current_locale(), i18n::DEFAULT_LOCALE);
    assert_eq!(i18n::t("common.success"), "Operación exitosa");

    let api = DiscountApi::new(Arc::new(ConfigManager::from_config(AppConfig::default())))
        .unwrap();
    assert_eq!(
        api.message("edicion_exitosa"),
        "Cambios guardados correctamente."
    );
}
