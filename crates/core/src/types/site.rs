//! Site settings: the editable key-value configuration and tagged images.
//!
//! `app_config` rows are merged onto a fixed set of defaults so every page has
//! a value for every key, and `site_images` rows drive the hero carousel and
//! the about/features imagery.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::id::SiteImageId;

/// Page section an image belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SiteSection {
    Hero,
    HeroSide,
    About,
    Catalog,
    Features,
}

impl SiteSection {
    /// All sections, in the order the admin lists them.
    pub const ALL: [Self; 5] = [
        Self::Hero,
        Self::HeroSide,
        Self::About,
        Self::Catalog,
        Self::Features,
    ];

    /// Parse a stored section value. Unknown values yield `None`.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "hero" => Some(Self::Hero),
            "hero-side" => Some(Self::HeroSide),
            "about" => Some(Self::About),
            "catalog" => Some(Self::Catalog),
            "features" => Some(Self::Features),
            _ => None,
        }
    }

    /// Value stored in the `section` column.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Hero => "hero",
            Self::HeroSide => "hero-side",
            Self::About => "about",
            Self::Catalog => "catalog",
            Self::Features => "features",
        }
    }

    /// Label shown in the admin.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Hero => "Carrusel principal",
            Self::HeroSide => "Imagen lateral del inicio",
            Self::About => "Quiénes somos",
            Self::Catalog => "Catálogo",
            Self::Features => "Características",
        }
    }
}

impl fmt::Display for SiteSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An image placed in one section of the public site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteImage {
    pub id: SiteImageId,
    pub section: SiteSection,
    pub url: String,
    pub alt: String,
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub display_order: i32,
    pub is_active: bool,
}

/// Alt text used when an admin uploads an image without one.
pub const DEFAULT_IMAGE_ALT: &str = "Imagen Industrial";

/// Generates `SiteConfig` with one field per known key, its default value,
/// and the key allow-list.
macro_rules! site_config {
    ($($field:ident => $default:expr),+ $(,)?) => {
        /// Public site configuration merged from `app_config` onto defaults.
        #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
        pub struct SiteConfig {
            $(pub $field: String,)+
        }

        impl Default for SiteConfig {
            fn default() -> Self {
                Self {
                    $($field: String::from($default),)+
                }
            }
        }

        impl SiteConfig {
            /// Every key the public site reads from `app_config`.
            pub const KEYS: &'static [&'static str] = &[$(stringify!($field),)+];

            /// Look up a value by its `app_config` key.
            #[must_use]
            pub fn get(&self, key: &str) -> Option<&str> {
                match key {
                    $(stringify!($field) => Some(self.$field.as_str()),)+
                    _ => None,
                }
            }

            fn slot(&mut self, key: &str) -> Option<&mut String> {
                match key {
                    $(stringify!($field) => Some(&mut self.$field),)+
                    _ => None,
                }
            }
        }
    };
}

site_config! {
    company_name => "BULTEX",
    company_slogan => "Uniformes Industriales",
    company_description => "",
    contact_phone => "",
    contact_email => "",
    address_text => "",
    map_url => "",
    quote_email => "",
    quote_whatsapp => "",
    whatsapp_message => "Hola, quiero cotizar uniformes.",
    facebook_url => "",
    instagram_url => "",
    linkedin_url => "",
    twitter_url => "",
    campaign_url => "/catalogo",
}

impl SiteConfig {
    /// Merge `app_config` rows onto the defaults.
    ///
    /// Keys outside [`SiteConfig::KEYS`] are ignored. Keys without a row keep
    /// their default value.
    #[must_use]
    pub fn merged<I, K, V>(rows: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut config = Self::default();
        for (key, value) in rows {
            if let Some(slot) = config.slot(key.as_ref()) {
                *slot = value.into();
            }
        }
        config
    }

    /// `https://wa.me/...` link that opens a chat prefilled with
    /// `whatsapp_message`, or `None` when no quote number is configured.
    #[must_use]
    pub fn whatsapp_link(&self) -> Option<String> {
        self.whatsapp_link_with(&self.whatsapp_message)
    }

    /// Same as [`SiteConfig::whatsapp_link`] with a custom prefilled message.
    #[must_use]
    pub fn whatsapp_link_with(&self, message: &str) -> Option<String> {
        let number: String = self
            .quote_whatsapp
            .chars()
            .filter(char::is_ascii_digit)
            .collect();
        if number.is_empty() {
            return None;
        }
        Some(format!(
            "https://wa.me/{number}?text={}",
            urlencoding::encode(message)
        ))
    }

    /// `tel:` link for the contact phone.
    #[must_use]
    pub fn phone_link(&self) -> Option<String> {
        let digits: String = self
            .contact_phone
            .chars()
            .filter(|c| c.is_ascii_digit() || *c == '+')
            .collect();
        (!digits.is_empty()).then(|| format!("tel:{digits}"))
    }

    /// Configured social links as `(label, url)` pairs, skipping empty ones.
    #[must_use]
    pub fn social_links(&self) -> Vec<(&'static str, &str)> {
        [
            ("Facebook", self.facebook_url.as_str()),
            ("Instagram", self.instagram_url.as_str()),
            ("LinkedIn", self.linkedin_url.as_str()),
            ("X", self.twitter_url.as_str()),
        ]
        .into_iter()
        .filter(|(_, url)| !url.trim().is_empty())
        .collect()
    }
}

/// `app_config` key holding the address that receives contact-form mail.
///
/// Deliberately not part of [`SiteConfig`]: it is never rendered publicly.
pub const FORM_RECIPIENT_KEY: &str = "form_recipient_email";

/// Tabs of the admin configuration editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ConfigTab {
    #[default]
    General,
    Contact,
    Quotes,
    Social,
}

/// One editable field of a configuration tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfigField {
    pub key: &'static str,
    pub label: &'static str,
    pub multiline: bool,
}

const fn field(key: &'static str, label: &'static str) -> ConfigField {
    ConfigField {
        key,
        label,
        multiline: false,
    }
}

const fn text_area(key: &'static str, label: &'static str) -> ConfigField {
    ConfigField {
        key,
        label,
        multiline: true,
    }
}

impl ConfigTab {
    pub const ALL: [Self; 4] = [Self::General, Self::Contact, Self::Quotes, Self::Social];

    /// Parse the `?tab=` query value; anything unknown falls back to general.
    #[must_use]
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some("contact") => Self::Contact,
            Some("quotes") => Self::Quotes,
            Some("social") => Self::Social,
            _ => Self::General,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::General => "general",
            Self::Contact => "contact",
            Self::Quotes => "quotes",
            Self::Social => "social",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::General => "General",
            Self::Contact => "Contacto",
            Self::Quotes => "Cotizaciones",
            Self::Social => "Redes sociales",
        }
    }

    /// Fields edited on this tab, in display order.
    #[must_use]
    pub const fn fields(self) -> &'static [ConfigField] {
        const GENERAL: &[ConfigField] = &[
            field("company_name", "Nombre de la empresa"),
            field("company_slogan", "Eslogan"),
            text_area("company_description", "Descripción"),
            field("campaign_url", "Enlace de campaña"),
        ];
        const CONTACT: &[ConfigField] = &[
            field("contact_phone", "Teléfono"),
            field("contact_email", "Correo de contacto"),
            text_area("address_text", "Dirección"),
            field("map_url", "Enlace del mapa"),
            field(FORM_RECIPIENT_KEY, "Correo que recibe el formulario"),
        ];
        const QUOTES: &[ConfigField] = &[
            field("quote_email", "Correo para cotizaciones"),
            field("quote_whatsapp", "WhatsApp para cotizaciones"),
            text_area("whatsapp_message", "Mensaje predeterminado de WhatsApp"),
        ];
        const SOCIAL: &[ConfigField] = &[
            field("facebook_url", "Facebook"),
            field("instagram_url", "Instagram"),
            field("linkedin_url", "LinkedIn"),
            field("twitter_url", "X / Twitter"),
        ];

        match self {
            Self::General => GENERAL,
            Self::Contact => CONTACT,
            Self::Quotes => QUOTES,
            Self::Social => SOCIAL,
        }
    }

    /// Pick this tab's keys out of a submitted form.
    ///
    /// Fields missing from the form are saved as empty strings so clearing an
    /// input clears the stored value.
    #[must_use]
    pub fn collect_values(self, form: &HashMap<String, String>) -> Vec<(&'static str, String)> {
        self.fields()
            .iter()
            .map(|f| {
                let value = form.get(f.key).map(|v| v.trim().to_string()).unwrap_or_default();
                (f.key, value)
            })
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_merged_single_key_keeps_other_defaults() {
        let config = SiteConfig::merged([("company_name", "Acme")]);
        let defaults = SiteConfig::default();

        assert_eq!(config.company_name, "Acme");
        for key in SiteConfig::KEYS.iter().filter(|k| **k != "company_name") {
            assert_eq!(config.get(key), defaults.get(key), "{key}");
        }
    }

    #[test]
    fn test_merged_ignores_unknown_keys() {
        let config = SiteConfig::merged([("not_a_key", "x"), (FORM_RECIPIENT_KEY, "ops@bultex.mx")]);
        assert_eq!(config, SiteConfig::default());
    }

    #[test]
    fn test_defaults() {
        let config = SiteConfig::default();
        assert_eq!(config.company_name, "BULTEX");
        assert_eq!(config.company_slogan, "Uniformes Industriales");
        assert_eq!(config.whatsapp_message, "Hola, quiero cotizar uniformes.");
        assert_eq!(config.campaign_url, "/catalogo");
        assert_eq!(config.contact_email, "");
        assert_eq!(SiteConfig::KEYS.len(), 15);
    }

    #[test]
    fn test_whatsapp_link_encodes_message() {
        let config = SiteConfig::merged([("quote_whatsapp", "+52 (81) 1234-5678")]);
        assert_eq!(
            config.whatsapp_link().unwrap(),
            "https://wa.me/528112345678?text=Hola%2C%20quiero%20cotizar%20uniformes."
        );
    }

    #[test]
    fn test_whatsapp_link_absent_without_number() {
        assert!(SiteConfig::default().whatsapp_link().is_none());
    }

    #[test]
    fn test_social_links_skip_empty() {
        let config = SiteConfig::merged([("instagram_url", "https://instagram.com/bultex")]);
        assert_eq!(
            config.social_links(),
            vec![("Instagram", "https://instagram.com/bultex")]
        );
    }

    #[test]
    fn test_section_parse_round_trip_and_unknown() {
        for section in SiteSection::ALL {
            assert_eq!(SiteSection::parse(section.as_str()), Some(section));
        }
        assert_eq!(SiteSection::parse("banner"), None);
        assert_eq!(SiteSection::parse("Hero"), None);
    }

    #[test]
    fn test_config_tab_parse_falls_back_to_general() {
        assert_eq!(ConfigTab::parse(Some("social")), ConfigTab::Social);
        assert_eq!(ConfigTab::parse(Some("bogus")), ConfigTab::General);
        assert_eq!(ConfigTab::parse(None), ConfigTab::General);
    }

    #[test]
    fn test_every_public_key_is_editable_on_some_tab() {
        for key in SiteConfig::KEYS {
            assert!(
                ConfigTab::ALL
                    .iter()
                    .any(|tab| tab.fields().iter().any(|f| f.key == *key)),
                "{key} has no tab"
            );
        }
    }

    #[test]
    fn test_collect_values_only_takes_tab_keys() {
        let mut form = HashMap::new();
        form.insert("facebook_url".to_string(), " https://fb.com/bultex ".to_string());
        form.insert("company_name".to_string(), "Ignored".to_string());

        let values = ConfigTab::Social.collect_values(&form);
        assert_eq!(values.len(), 4);
        assert!(values.contains(&("facebook_url", "https://fb.com/bultex".to_string())));
        assert!(values.contains(&("twitter_url", String::new())));
        assert!(!values.iter().any(|(k, _)| *k == "company_name"));
    }
}
