use futures::future::LocalBoxFuture;

use crate::error::Result;
use crate::geojson_features::FeatureCollection;

/// Source of feature collections, addressed by resource name relative to
/// the data directory.
pub trait GeoDataSource {
    fn fetch<'a>(&'a self, resource: &'a str) -> LocalBoxFuture<'a, Result<FeatureCollection>>;
}

/// Fetches resources over HTTP with a timestamp query so intermediate caches
/// are always bypassed.
#[cfg(target_arch = "wasm32")]
pub struct HttpFetcher {
    data_dir: String,
}

#[cfg(target_arch = "wasm32")]
impl HttpFetcher {
    pub fn new(data_dir: &str) -> Self {
        Self {
            data_dir: data_dir.to_string(),
        }
    }

    pub fn url_for(&self, resource: &str) -> String {
        crate::cache_keys::make_resource_url(&self.data_dir, resource, js_sys::Date::now())
    }

    async fn get(&self, resource: &str) -> Result<FeatureCollection> {
        use crate::error::MapError;
        use gloo_net::http::Request;

        let url = self.url_for(resource);
        let resp = Request::get(&url)
            .send()
            .await
            .map_err(|e| MapError::Network {
                resource: resource.to_string(),
                message: e.to_string(),
            })?;
        if !resp.ok() {
            return Err(MapError::Status {
                resource: resource.to_string(),
                status: resp.status(),
            });
        }
        let text = resp.text().await.map_err(|e| MapError::Network {
            resource: resource.to_string(),
            message: e.to_string(),
        })?;
        FeatureCollection::from_json_str(&text)
    }
}

#[cfg(target_arch = "wasm32")]
impl GeoDataSource for HttpFetcher {
    fn fetch<'a>(&'a self, resource: &'a str) -> LocalBoxFuture<'a, Result<FeatureCollection>> {
        Box::pin(self.get(resource))
    }
}
