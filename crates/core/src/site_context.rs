//! Published snapshot of the site settings.
//!
//! Every page needs the merged [`SiteConfig`] and the active [`SiteImage`]s.
//! Instead of each handler querying both tables, a [`SiteContext`] holds the
//! latest [`SiteSnapshot`] in a `tokio::sync::watch` channel. Handlers read
//! [`SiteContext::current`]; admin writes call [`SiteContext::refresh`] to
//! re-run the load and publish the result.
//!
//! With the `postgres` feature, [`PgSiteSource`] reads the snapshot from the
//! `app_config` and `site_images` tables, and [`notify_site_changed`] /
//! [`listen_for_changes`] carry a refresh request from the admin process to
//! the public site over `LISTEN`/`NOTIFY`.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::watch;

use crate::types::{SiteConfig, SiteImage, SiteSection};

/// Error type returned by a [`SiteSource`].
pub type SourceError = Box<dyn std::error::Error + Send + Sync>;

/// Errors from loading the site snapshot.
#[derive(Debug, thiserror::Error)]
pub enum SiteContextError {
    /// The configuration table could not be read.
    #[error("failed to load site configuration: {0}")]
    Config(#[source] SourceError),
}

/// Where the snapshot comes from.
pub trait SiteSource: Send + Sync {
    /// All `(key, value)` rows of the configuration table.
    fn fetch_config_rows(
        &self,
    ) -> impl Future<Output = Result<Vec<(String, String)>, SourceError>> + Send;

    /// Active images ordered by `display_order`.
    fn fetch_active_images(&self) -> impl Future<Output = Result<Vec<SiteImage>, SourceError>> + Send;
}

/// Merged configuration plus the active images, as seen by one request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SiteSnapshot {
    pub config: SiteConfig,
    pub images: Vec<SiteImage>,
}

impl SiteSnapshot {
    /// Active images of one section, in display order.
    pub fn images_for(&self, section: SiteSection) -> impl Iterator<Item = &SiteImage> {
        self.images.iter().filter(move |img| img.section == section)
    }

    /// First active image of a section.
    #[must_use]
    pub fn first_image(&self, section: SiteSection) -> Option<&SiteImage> {
        self.images_for(section).next()
    }
}

/// Shared handle to the currently published [`SiteSnapshot`].
///
/// Cheap to clone; all clones publish to and read from the same channel.
#[derive(Clone)]
pub struct SiteContext {
    sender: Arc<watch::Sender<Arc<SiteSnapshot>>>,
}

impl SiteContext {
    /// Create a context publishing `initial`.
    #[must_use]
    pub fn new(initial: SiteSnapshot) -> Self {
        let (sender, _receiver) = watch::channel(Arc::new(initial));
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Load a snapshot without publishing it.
    ///
    /// Both tables are read concurrently. Rows for unknown config keys are
    /// ignored. A failing image query degrades to an empty image list; a
    /// failing config query is an error.
    ///
    /// # Errors
    ///
    /// Returns [`SiteContextError::Config`] if the configuration rows cannot
    /// be read.
    pub async fn load<S: SiteSource>(source: &S) -> Result<SiteSnapshot, SiteContextError> {
        let (config_rows, images) =
            tokio::join!(source.fetch_config_rows(), source.fetch_active_images());

        let config_rows = config_rows.map_err(|e| {
            tracing::error!(error = %e, "Failed to load site configuration");
            SiteContextError::Config(e)
        })?;

        let mut images = images.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Failed to load site images, continuing without them");
            Vec::new()
        });
        images.retain(|img| img.is_active);
        images.sort_by_key(|img| img.display_order);

        Ok(SiteSnapshot {
            config: SiteConfig::merged(config_rows),
            images,
        })
    }

    /// Load the first snapshot at startup.
    ///
    /// Falls back to the defaults when the configuration cannot be read so
    /// the site still renders.
    pub async fn bootstrap<S: SiteSource>(source: &S) -> Self {
        match Self::load(source).await {
            Ok(snapshot) => {
                tracing::info!(images = snapshot.images.len(), "Site settings loaded");
                Self::new(snapshot)
            }
            Err(e) => {
                tracing::error!(error = %e, "Starting with default site settings");
                Self::new(SiteSnapshot::default())
            }
        }
    }

    /// The snapshot currently published.
    #[must_use]
    pub fn current(&self) -> Arc<SiteSnapshot> {
        Arc::clone(&self.sender.borrow())
    }

    /// Receiver that observes every future publication.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Arc<SiteSnapshot>> {
        self.sender.subscribe()
    }

    /// Re-run [`SiteContext::load`] and publish the result.
    ///
    /// On failure the previous snapshot stays published.
    ///
    /// # Errors
    ///
    /// Returns the load error when the configuration cannot be read.
    pub async fn refresh<S: SiteSource>(
        &self,
        source: &S,
    ) -> Result<Arc<SiteSnapshot>, SiteContextError> {
        let snapshot = Arc::new(Self::load(source).await?);
        self.sender.send_replace(Arc::clone(&snapshot));
        tracing::debug!("Site settings refreshed");
        Ok(snapshot)
    }
}

#[cfg(feature = "postgres")]
pub use pg::{PgSiteSource, SITE_CHANGED_CHANNEL, listen_for_changes, notify_site_changed};

#[cfg(feature = "postgres")]
mod pg {
    use sqlx::PgPool;
    use sqlx::postgres::PgListener;
    use uuid::Uuid;

    use super::{SiteContext, SiteSource, SourceError};
    use crate::types::{SiteImage, SiteImageId, SiteSection};

    /// `NOTIFY` channel used to ask the public site to refresh.
    pub const SITE_CHANGED_CHANNEL: &str = "site_context_refresh";

    #[derive(sqlx::FromRow)]
    struct SiteImageRow {
        id: Uuid,
        section: String,
        url: String,
        alt: Option<String>,
        title: Option<String>,
        subtitle: Option<String>,
        display_order: i32,
        is_active: bool,
    }

    impl SiteImageRow {
        fn into_image(self) -> Option<SiteImage> {
            let Some(section) = SiteSection::parse(&self.section) else {
                tracing::debug!(section = %self.section, id = %self.id, "Skipping image with unknown section");
                return None;
            };
            Some(SiteImage {
                id: SiteImageId::new(self.id),
                section,
                url: self.url,
                alt: self.alt.unwrap_or_default(),
                title: self.title,
                subtitle: self.subtitle,
                display_order: self.display_order,
                is_active: self.is_active,
            })
        }
    }

    /// Reads the snapshot from `app_config` and `site_images`.
    pub struct PgSiteSource<'a> {
        pool: &'a PgPool,
    }

    impl<'a> PgSiteSource<'a> {
        #[must_use]
        pub const fn new(pool: &'a PgPool) -> Self {
            Self { pool }
        }
    }

    impl SiteSource for PgSiteSource<'_> {
        async fn fetch_config_rows(&self) -> Result<Vec<(String, String)>, SourceError> {
            let rows = sqlx::query_as::<_, (String, String)>("SELECT key, value FROM app_config")
                .fetch_all(self.pool)
                .await?;
            Ok(rows)
        }

        async fn fetch_active_images(&self) -> Result<Vec<SiteImage>, SourceError> {
            let rows = sqlx::query_as::<_, SiteImageRow>(
                r"
                SELECT id, section, url, alt, title, subtitle, display_order, is_active
                FROM site_images
                WHERE is_active = TRUE
                ORDER BY display_order ASC, created_at ASC
                ",
            )
            .fetch_all(self.pool)
            .await?;

            Ok(rows.into_iter().filter_map(SiteImageRow::into_image).collect())
        }
    }

    /// Ask every listening process to refresh its snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if the notification cannot be sent.
    pub async fn notify_site_changed(pool: &PgPool) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT pg_notify($1, '')")
            .bind(SITE_CHANGED_CHANNEL)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Refresh `context` whenever [`notify_site_changed`] is called anywhere.
    ///
    /// Runs until the listener connection fails permanently. A dropped
    /// connection triggers one refresh since notifications may have been
    /// missed while it was down.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener cannot connect or reconnect.
    pub async fn listen_for_changes(pool: PgPool, context: SiteContext) -> Result<(), sqlx::Error> {
        let mut listener = PgListener::connect_with(&pool).await?;
        listener.listen(SITE_CHANGED_CHANNEL).await?;
        tracing::info!(channel = SITE_CHANGED_CHANNEL, "Listening for site setting changes");

        loop {
            match listener.try_recv().await? {
                Some(_) => tracing::info!("Site settings changed, refreshing"),
                None => tracing::warn!("Site change listener reconnecting, refreshing"),
            }

            let source = PgSiteSource::new(&pool);
            if let Err(e) = context.refresh(&source).await {
                tracing::error!(error = %e, "Failed to refresh site settings");
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::{SiteImageId, id::random_uuid};

    struct FakeSource {
        config: Result<Vec<(String, String)>, String>,
        images: Result<Vec<SiteImage>, String>,
    }

    impl SiteSource for FakeSource {
        async fn fetch_config_rows(&self) -> Result<Vec<(String, String)>, SourceError> {
            self.config.clone().map_err(Into::into)
        }

        async fn fetch_active_images(&self) -> Result<Vec<SiteImage>, SourceError> {
            self.images.clone().map_err(Into::into)
        }
    }

    fn image(section: SiteSection, order: i32, active: bool) -> SiteImage {
        SiteImage {
            id: SiteImageId::new(random_uuid()),
            section,
            url: format!("https://cdn.example.com/{section}-{order}.jpg"),
            alt: "Imagen".to_string(),
            title: None,
            subtitle: None,
            display_order: order,
            is_active: active,
        }
    }

    fn rows(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[tokio::test]
    async fn test_load_merges_config_and_orders_images() {
        let source = FakeSource {
            config: Ok(rows(&[("company_name", "Acme"), ("legacy_key", "x")])),
            images: Ok(vec![
                image(SiteSection::Hero, 2, true),
                image(SiteSection::Hero, 1, true),
                image(SiteSection::About, 0, false),
            ]),
        };

        let snapshot = SiteContext::load(&source).await.unwrap();
        assert_eq!(snapshot.config.company_name, "Acme");
        assert_eq!(snapshot.config.company_slogan, "Uniformes Industriales");

        let orders: Vec<i32> = snapshot
            .images_for(SiteSection::Hero)
            .map(|i| i.display_order)
            .collect();
        assert_eq!(orders, vec![1, 2]);
        assert!(snapshot.first_image(SiteSection::About).is_none());
    }

    #[tokio::test]
    async fn test_load_degrades_when_images_fail() {
        let source = FakeSource {
            config: Ok(rows(&[("company_name", "Acme")])),
            images: Err("relation \"site_images\" does not exist".to_string()),
        };

        let snapshot = SiteContext::load(&source).await.unwrap();
        assert!(snapshot.images.is_empty());
        assert_eq!(snapshot.config.company_name, "Acme");
    }

    #[tokio::test]
    async fn test_load_fails_when_config_fails() {
        let source = FakeSource {
            config: Err("connection refused".to_string()),
            images: Ok(Vec::new()),
        };

        assert!(matches!(
            SiteContext::load(&source).await,
            Err(SiteContextError::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_refresh_publishes_to_subscribers() {
        let context = SiteContext::new(SiteSnapshot::default());
        let mut receiver = context.subscribe();

        let source = FakeSource {
            config: Ok(rows(&[("company_slogan", "Uniformes que Trabajan Contigo")])),
            images: Ok(vec![image(SiteSection::Features, 0, true)]),
        };
        context.refresh(&source).await.unwrap();

        assert!(receiver.has_changed().unwrap());
        let seen = receiver.borrow_and_update().clone();
        assert_eq!(seen.config.company_slogan, "Uniformes que Trabajan Contigo");
        assert_eq!(context.current().images.len(), 1);
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_previous_snapshot() {
        let good = FakeSource {
            config: Ok(rows(&[("company_name", "Acme")])),
            images: Ok(Vec::new()),
        };
        let context = SiteContext::bootstrap(&good).await;

        let bad = FakeSource {
            config: Err("timeout".to_string()),
            images: Ok(Vec::new()),
        };
        assert!(context.refresh(&bad).await.is_err());
        assert_eq!(context.current().config.company_name, "Acme");
    }

    #[tokio::test]
    async fn test_bootstrap_falls_back_to_defaults() {
        let bad = FakeSource {
            config: Err("timeout".to_string()),
            images: Ok(Vec::new()),
        };
        let context = SiteContext::bootstrap(&bad).await;
        assert_eq!(*context.current(), SiteSnapshot::default());
    }
}
