use reqwest::{Client, Response, StatusCode, Url};
use tracing::{debug, instrument};

use super::wire::LayoutRecord;
use super::{GatewayError, LayoutGateway};
use crate::common::config::RemoteSettings;
use crate::model::Layout;

/// [`LayoutGateway`] over the layout service's JSON API.
#[derive(Debug, Clone)]
pub struct HttpGateway {
    client: Client,
    base_url: Url,
}

impl HttpGateway {
    pub fn new(settings: &RemoteSettings) -> Result<Self, GatewayError> {
        let base_url = Url::parse(&settings.base_url).map_err(|err| {
            GatewayError::unavailable(format!("invalid base url {:?}: {err}", settings.base_url))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(GatewayError::unavailable(format!(
                "base url {:?} cannot hold paths",
                settings.base_url
            )));
        }
        let client = Client::builder()
            .connect_timeout(settings.connect_timeout())
            .timeout(settings.timeout())
            .build()?;
        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url { &self.base_url }

    /// Appends `segments` to the base url, each encoded as a single segment.
    pub fn endpoint(&self, segments: &[&str]) -> Result<Url, GatewayError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| GatewayError::unavailable("base url cannot hold paths"))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn record(response: Response, subject: &str) -> Result<Layout, GatewayError> {
        let record: LayoutRecord = check_status(response, subject)?.json().await?;
        Ok(record.into())
    }
}

fn check_status(response: Response, subject: &str) -> Result<Response, GatewayError> {
    let status = response.status();
    debug!(%status, url = %response.url(), "layout service answered");
    match status {
        StatusCode::NOT_FOUND => Err(GatewayError::not_found(subject)),
        status if status.is_success() => Ok(response),
        status => Err(GatewayError::unavailable(format!("server answered {status}"))),
    }
}

impl LayoutGateway for HttpGateway {
    #[instrument(skip(self))]
    async fn fetch_by_name(&self, name: &str) -> Result<Layout, GatewayError> {
        let url = self.endpoint(&["layouts"])?;
        let response = self.client.get(url).query(&[("name", name)]).send().await?;
        Self::record(response, name).await
    }

    #[instrument(skip(self))]
    async fn fetch_all(&self) -> Result<Vec<Layout>, GatewayError> {
        let url = self.endpoint(&["layouts", "all"])?;
        let response = self.client.get(url).send().await?;
        let records: Vec<LayoutRecord> = check_status(response, "all")?.json().await?;
        Ok(records.into_iter().map(Layout::from).collect())
    }

    #[instrument(skip(self, layout), fields(name = %layout.name))]
    async fn create(&self, layout: &Layout) -> Result<Layout, GatewayError> {
        let url = self.endpoint(&["layouts"])?;
        let body = LayoutRecord { id: None, ..LayoutRecord::from(layout) };
        let response = self.client.post(url).json(&body).send().await?;
        Self::record(response, &layout.name).await
    }

    #[instrument(skip(self, layout), fields(name = %layout.name, id = ?layout.id))]
    async fn replace(&self, layout: &Layout) -> Result<Layout, GatewayError> {
        let url = self.endpoint(&["layouts"])?;
        let response = self.client.put(url).json(&LayoutRecord::from(layout)).send().await?;
        Self::record(response, &layout.name).await
    }

    #[instrument(skip(self))]
    async fn delete_by_name(&self, name: &str) -> Result<(), GatewayError> {
        let url = self.endpoint(&["layouts", name])?;
        let response = self.client.delete(url).send().await?;
        check_status(response, name)?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn reset_to_default(&self) -> Result<Layout, GatewayError> {
        let url = self.endpoint(&["layouts", "reset"])?;
        let response = self.client.post(url).send().await?;
        Self::record(response, crate::model::DEFAULT_LAYOUT_NAME).await
    }
}
