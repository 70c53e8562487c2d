use std::sync::Arc;

use futures::future::BoxFuture;
use reqwest::{Client, Response};
use serde_json::Value;
use tracing::warn;

use crate::{
    dao::{
        models::{LoadedSheet, SheetDocument},
        sheet_bridge::SheetBridge,
        storage::StorageResult,
    },
    state::division::Division,
};

use super::{
    config::GasConfig,
    error::{GasBridgeError, GasResult},
    models::{
        ACTION_ARCHIVE, ACTION_LOAD, ACTION_SAVE, GasActionRequest, GasResponse, GasSheetData,
    },
};

/// Spreadsheet bridge backed by a Google Apps Script web app.
#[derive(Clone)]
pub struct GasSheetBridge {
    client: Client,
    web_app_url: Arc<str>,
}

impl GasSheetBridge {
    /// Build the HTTP client used for every call to the web app.
    pub fn connect(config: GasConfig) -> GasResult<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|source| GasBridgeError::ClientBuilder { source })?;

        Ok(Self {
            client,
            web_app_url: Arc::<str>::from(config.web_app_url.trim()),
        })
    }

    async fn fetch_sheet(&self, division: Division) -> GasResult<LoadedSheet> {
        let response = self
            .client
            .get(self.web_app_url.as_ref())
            .query(&[("gender", division.as_str())])
            .send()
            .await
            .map_err(|source| GasBridgeError::RequestSend {
                action: ACTION_LOAD,
                source,
            })?;
        let response = ensure_success(response, ACTION_LOAD)?;

        let envelope = response
            .json::<GasResponse<GasSheetData>>()
            .await
            .map_err(|source| GasBridgeError::DecodeResponse {
                action: ACTION_LOAD,
                source,
            })?;
        let (data, _) = accept(envelope, ACTION_LOAD)?;
        let data = data.ok_or(GasBridgeError::MissingData {
            action: ACTION_LOAD,
        })?;
        Ok(data.into())
    }

    async fn post_action(&self, request: GasActionRequest) -> GasResult<Option<String>> {
        let action = request.action;
        let response = self
            .client
            .post(self.web_app_url.as_ref())
            .json(&request)
            .send()
            .await
            .map_err(|source| GasBridgeError::RequestSend { action, source })?;
        let response = ensure_success(response, action)?;

        let body = response
            .text()
            .await
            .map_err(|source| GasBridgeError::DecodeResponse { action, source })?;

        // A 2xx without a JSON envelope still means the script ran.
        match serde_json::from_str::<GasResponse<Value>>(&body) {
            Ok(envelope) => accept(envelope, action).map(|(_, message)| message),
            Err(err) => {
                warn!(action, error = %err, "Apps Script reply is not JSON; assuming success");
                Ok(None)
            }
        }
    }
}

fn ensure_success(response: Response, action: &'static str) -> GasResult<Response> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(GasBridgeError::RequestStatus { action, status })
    }
}

fn accept<T>(
    envelope: GasResponse<T>,
    action: &'static str,
) -> GasResult<(Option<T>, Option<String>)> {
    if envelope.success {
        Ok((envelope.data, envelope.message))
    } else {
        Err(GasBridgeError::Rejected {
            action,
            message: envelope
                .message
                .unwrap_or_else(|| "no message provided".to_string()),
        })
    }
}

impl SheetBridge for GasSheetBridge {
    fn save(
        &self,
        division: Division,
        document: SheetDocument,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let bridge = self.clone();
        Box::pin(async move {
            let request = GasActionRequest {
                gender: division,
                action: ACTION_SAVE,
                new_state: Some(document.into()),
            };
            bridge.post_action(request).await?;
            Ok(())
        })
    }

    fn load(&self, division: Division) -> BoxFuture<'static, StorageResult<LoadedSheet>> {
        let bridge = self.clone();
        Box::pin(async move { bridge.fetch_sheet(division).await.map_err(Into::into) })
    }

    fn archive(&self, division: Division) -> BoxFuture<'static, StorageResult<Option<String>>> {
        let bridge = self.clone();
        Box::pin(async move {
            let request = GasActionRequest {
                gender: division,
                action: ACTION_ARCHIVE,
                new_state: None,
            };
            bridge.post_action(request).await.map_err(Into::into)
        })
    }
}
