use anyhow::Result;
use fluent_bundle::concurrent::FluentBundle;
use fluent_bundle::{FluentArgs, FluentResource, FluentValue};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use unic_langid::LanguageIdentifier;

/// Language used when the user's language is unknown or unsupported
pub const DEFAULT_LANGUAGE: &str = "ru";

/// Locales shipped under `locales/<lang>/main.ftl`
pub const SUPPORTED_LANGUAGES: [&str; 2] = ["ru", "en"];

/// Environment variable pointing at a directory that overrides the built-in locales
pub const LOCALES_DIR_ENV: &str = "LOCALES_DIR";

/// Locale files compiled into the binary
const EMBEDDED_LOCALES: [(&str, &str); 2] = [
    ("ru", include_str!("../locales/ru/main.ftl")),
    ("en", include_str!("../locales/en/main.ftl")),
];

/// Localization manager for the ad placement bot
pub struct LocalizationManager {
    bundles: HashMap<String, FluentBundle<FluentResource>>,
}

impl std::fmt::Debug for LocalizationManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalizationManager")
            .field("languages", &self.bundles.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl LocalizationManager {
    /// Create a manager from the locale files compiled into the binary
    pub fn new() -> Result<Self> {
        Self::from_sources(|locale| {
            EMBEDDED_LOCALES
                .iter()
                .find(|(lang, _)| *lang == locale)
                .map(|(_, content)| (format!("embedded:{}", lang_file(locale)), content.to_string()))
                .ok_or_else(|| anyhow::anyhow!("No embedded locale for {}", locale))
        })
    }

    /// Create a manager from `<dir>/<lang>/main.ftl` files
    pub fn from_dir(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        Self::from_sources(|locale| {
            let resource_path = dir.join(lang_file(locale));
            let content = fs::read_to_string(&resource_path).map_err(|e| {
                anyhow::anyhow!("Failed to read locale file {}: {}", resource_path.display(), e)
            })?;
            Ok((resource_path.display().to_string(), content))
        })
    }

    fn from_sources(load: impl Fn(&str) -> Result<(String, String)>) -> Result<Self> {
        let mut bundles = HashMap::new();

        for locale_str in SUPPORTED_LANGUAGES {
            let locale: LanguageIdentifier = locale_str.parse()?;
            let (origin, content) = load(locale_str)?;
            let bundle = Self::create_bundle(&locale, &origin, content)?;
            bundles.insert(locale_str.to_string(), bundle);
        }

        Ok(Self { bundles })
    }

    /// Create a fluent bundle for a specific locale
    fn create_bundle(
        locale: &LanguageIdentifier,
        origin: &str,
        content: String,
    ) -> Result<FluentBundle<FluentResource>> {
        let mut bundle = FluentBundle::new_concurrent(vec![locale.clone()]);
        // Messages are sent verbatim to Telegram, bidi isolation marks would leak into them
        bundle.set_use_isolating(false);

        let resource = FluentResource::try_new(content)
            .map_err(|(_, errors)| anyhow::anyhow!("Invalid locale file {}: {:?}", origin, errors))?;
        bundle
            .add_resource(resource)
            .map_err(|errors| anyhow::anyhow!("Duplicate messages in {}: {:?}", origin, errors))?;

        Ok(bundle)
    }

    /// Get a localized message in a specific language
    pub fn get_message_in_language(
        &self,
        key: &str,
        language: &str,
        args: Option<&HashMap<&str, &str>>,
    ) -> String {
        let bundle = match self.bundles.get(language) {
            Some(bundle) => bundle,
            None => match self.bundles.get(DEFAULT_LANGUAGE) {
                Some(bundle) => bundle,
                None => return format!("Missing translation: {}", key),
            },
        };

        let msg = match bundle.get_message(key) {
            Some(msg) => msg,
            None => return format!("Missing translation: {}", key),
        };

        let pattern = match msg.value() {
            Some(pattern) => pattern,
            None => return format!("Missing value for key: {}", key),
        };

        let mut value = String::new();

        if let Some(args) = args {
            let fluent_args =
                FluentArgs::from_iter(args.iter().map(|(k, v)| (*k, FluentValue::from(*v))));

            let _ = bundle.write_pattern(&mut value, pattern, Some(&fluent_args), &mut vec![]);
        } else {
            let _ = bundle.write_pattern(&mut value, pattern, None, &mut vec![]);
        }

        value
    }

    /// Get a localized message with arguments in a specific language
    pub fn get_message_with_args_in_language(
        &self,
        key: &str,
        language: &str,
        args: &[(&str, &str)],
    ) -> String {
        let args_map: HashMap<&str, &str> = args.iter().cloned().collect();
        self.get_message_in_language(key, language, Some(&args_map))
    }

    /// Check if a language is supported
    pub fn is_language_supported(&self, language: &str) -> bool {
        self.bundles.contains_key(language)
    }
}

fn lang_file(locale: &str) -> String {
    format!("{}/main.ftl", locale)
}

/// Create the shared localization manager from the built-in locales
pub fn create_localization_manager() -> Result<Arc<LocalizationManager>> {
    Ok(Arc::new(LocalizationManager::new()?))
}

/// Create the shared localization manager, preferring `locales_dir` when set
pub fn load_localization_manager(locales_dir: Option<&str>) -> Result<Arc<LocalizationManager>> {
    match locales_dir {
        Some(dir) => {
            tracing::info!(locales_dir = %dir, "Loading locales from directory");
            Ok(Arc::new(LocalizationManager::from_dir(dir)?))
        }
        None => create_localization_manager(),
    }
}

/// Convenience function to get a localized message in user's language
pub fn t_lang(
    manager: &LocalizationManager,
    key: &str,
    language_code: Option<&str>,
) -> String {
    let language = detect_language(manager, language_code);
    manager.get_message_in_language(key, &language, None)
}

/// Convenience function to get a localized message with arguments in user's language
pub fn t_args_lang(
    manager: &LocalizationManager,
    key: &str,
    args: &[(&str, &str)],
    language_code: Option<&str>,
) -> String {
    let language = detect_language(manager, language_code);
    manager.get_message_with_args_in_language(key, &language, args)
}

/// Detect the appropriate language based on user's Telegram language code
pub fn detect_language(manager: &LocalizationManager, language_code: Option<&str>) -> String {
    if let Some(code) = language_code {
        // "ru-RU" -> "ru", "en-US" -> "en"
        let lang = code.split('-').next().unwrap_or(code).to_lowercase();

        if manager.is_language_supported(&lang) {
            return lang;
        }
    }

    DEFAULT_LANGUAGE.to_string()
}
