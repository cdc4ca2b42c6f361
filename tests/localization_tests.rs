//! # Localization Tests
//!
//! Message retrieval, argument interpolation and language fallback for the
//! shipped `ru` and `en` locales.

use ad_placement_bot::localization::{
    create_localization_manager, detect_language, load_localization_manager, t_args_lang, t_lang,
    LocalizationManager, SUPPORTED_LANGUAGES,
};
use std::collections::HashMap;
use std::sync::Arc;

#[cfg(test)]
mod tests {
    use super::*;

    fn setup_localization() -> Arc<LocalizationManager> {
        create_localization_manager().expect("Failed to create localization manager")
    }

    const KEYS: [&str; 17] = [
        "welcome",
        "order-button",
        "help",
        "error-invalid-format",
        "error-tariff-not-found",
        "error-order-failed",
        "invoice-title",
        "payment-thanks",
        "payment-plan",
        "payment-duration",
        "payment-duration-value",
        "payment-amount",
        "payment-amount-value",
        "payment-contact",
        "payment-order-id",
        "payment-success-fallback",
        "pre-checkout-rejected",
    ];

    #[test]
    fn test_every_key_exists_in_every_language() {
        let manager = setup_localization();

        for language in SUPPORTED_LANGUAGES {
            for key in KEYS {
                let message = manager.get_message_in_language(key, language, None);
                assert!(
                    !message.starts_with("Missing"),
                    "{} missing in {}",
                    key,
                    language
                );
            }
        }
    }

    #[test]
    fn test_russian_order_errors_are_exact() {
        let manager = setup_localization();

        assert_eq!(
            manager.get_message_in_language("error-invalid-format", "ru", None),
            "❌ Ошибка формата данных"
        );
        assert_eq!(
            manager.get_message_in_language("error-tariff-not-found", "ru", None),
            "❌ Ошибка: тариф не найден"
        );
        assert_eq!(
            manager.get_message_in_language("error-order-failed", "ru", None),
            "❌ Произошла ошибка при обработке заказа"
        );
    }

    #[test]
    fn test_get_message_nonexistent_key() {
        let manager = setup_localization();

        let message = manager.get_message_in_language("nonexistent-key", "ru", None);
        assert!(message.starts_with("Missing translation:"));
    }

    #[test]
    fn test_unsupported_language_falls_back_to_russian() {
        let manager = setup_localization();

        let message = manager.get_message_in_language("welcome", "de", None);
        assert_eq!(message, "Добро пожаловать! Нажмите кнопку для заказа рекламы.");
    }

    #[test]
    fn test_arguments_are_interpolated_without_isolation_marks() {
        let manager = setup_localization();

        let mut args = HashMap::new();
        args.insert("plan", "1 месяц");
        let title = manager.get_message_in_language("invoice-title", "ru", Some(&args));

        assert_eq!(title, "Реклама в паблике - 1 месяц");
        assert!(!title.contains('\u{2068}'));
        assert!(!title.contains('\u{2069}'));
    }

    #[test]
    fn test_language_detection() {
        let manager = setup_localization();

        assert_eq!(detect_language(&manager, Some("ru")), "ru");
        assert_eq!(detect_language(&manager, Some("ru-RU")), "ru");
        assert_eq!(detect_language(&manager, Some("en")), "en");
        assert_eq!(detect_language(&manager, Some("en-GB")), "en");
        assert_eq!(detect_language(&manager, Some("EN")), "en");
        assert_eq!(detect_language(&manager, Some("uk")), "ru");
        assert_eq!(detect_language(&manager, None), "ru");
    }

    #[test]
    fn test_convenience_functions() {
        let manager = setup_localization();

        assert_eq!(t_lang(&manager, "help", Some("en")), "/start - start\n/help - help");

        let duration = t_args_lang(&manager, "payment-duration-value", &[("months", "3")], None);
        assert_eq!(duration, "3 месяцев");

        let amount = t_args_lang(
            &manager,
            "payment-amount-value",
            &[("amount", "250"), ("currency", "RUB")],
            Some("ru"),
        );
        assert_eq!(amount, "250 руб.");

        let amount = t_args_lang(
            &manager,
            "payment-amount-value",
            &[("amount", "250"), ("currency", "EUR")],
            Some("ru"),
        );
        assert_eq!(amount, "250 EUR");
    }

    #[test]
    fn test_builtin_locales_do_not_touch_the_filesystem() {
        // A missing directory only matters when one is asked for
        let builtin = load_localization_manager(None).expect("built-in locales");
        assert_eq!(
            builtin.get_message_in_language("help", "ru", None),
            "/start - начать\n/help - помощь"
        );

        let result = load_localization_manager(Some("/definitely/not/here/locales"));
        assert!(result.is_err());
    }

    #[test]
    fn test_locales_directory_overrides_builtin_messages() {
        let dir = tempfile::tempdir().expect("temp dir");
        for (language, welcome) in [("ru", "Привет из каталога"), ("en", "Hello from disk")] {
            let lang_dir = dir.path().join(language);
            std::fs::create_dir_all(&lang_dir).expect("create locale dir");
            std::fs::write(lang_dir.join("main.ftl"), format!("welcome = {}\n", welcome))
                .expect("write locale file");
        }

        let manager = load_localization_manager(dir.path().to_str()).expect("locales from dir");
        assert_eq!(t_lang(&manager, "welcome", Some("ru")), "Привет из каталога");
        assert_eq!(t_lang(&manager, "welcome", Some("en-US")), "Hello from disk");
        assert!(t_lang(&manager, "help", None).starts_with("Missing translation:"));
    }

    #[test]
    fn test_invalid_locale_file_is_rejected() {
        let dir = tempfile::tempdir().expect("temp dir");
        for language in SUPPORTED_LANGUAGES {
            let lang_dir = dir.path().join(language);
            std::fs::create_dir_all(&lang_dir).expect("create locale dir");
            std::fs::write(lang_dir.join("main.ftl"), "welcome = {\n").expect("write locale file");
        }

        assert!(LocalizationManager::from_dir(dir.path()).is_err());
    }

    #[test]
    fn test_manager_can_be_shared_across_threads() {
        let manager = setup_localization();
        let handle = {
            let manager = Arc::clone(&manager);
            std::thread::spawn(move || t_lang(&manager, "order-button", Some("en")))
        };

        let from_thread = handle.join().expect("thread finished");
        assert_eq!(from_thread, t_lang(&manager, "order-button", Some("en")));
    }

    #[test]
    fn test_languages_differ() {
        let manager = setup_localization();

        let russian = manager.get_message_in_language("payment-success-fallback", "ru", None);
        let english = manager.get_message_in_language("payment-success-fallback", "en", None);
        assert_ne!(russian, english);
        assert!(russian.starts_with('✅'));
        assert!(english.starts_with('✅'));
    }
}
