//! REST implementation of the canvas service
//!
//! Uses the blocking reqwest client: uploads run one request at a time, in
//! order, and every request is bounded by the configured timeout.

use std::time::Duration;

use reqwest::blocking::{multipart, Client, RequestBuilder, Response};
use reqwest::StatusCode;
use serde_json::{json, Value};

use crate::error::RemoteError;
use crate::layout::BoundingBox;
use crate::settings::ServiceConfig;

use super::{
    body, collect_pages, CanvasRecord, CanvasService, ElementId, NewCanvas, NewImage,
    PlacementRequest, TextBlock, Workspace, MAX_WORKSPACE_PAGES,
};

/// Fields of the presigned upload form, in the order the storage backend expects
const UPLOAD_FORM_FIELDS: [&str; 7] = [
    "key",
    "bucket",
    "X-Amz-Algorithm",
    "X-Amz-Credential",
    "X-Amz-Date",
    "Policy",
    "X-Amz-Signature",
];

/// Authenticated client for user-level endpoints
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    api_base_url: String,
    token: String,
}

impl ApiClient {
    pub fn new(config: &ServiceConfig, token: impl Into<String>) -> Result<Self, RemoteError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self {
            client,
            api_base_url: config.api_base_url.trim_end_matches('/').to_string(),
            token: token.into(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_base_url, path)
    }

    fn get(&self, path: &str) -> RequestBuilder {
        self.client.get(self.url(path)).bearer_auth(&self.token)
    }

    fn post(&self, path: &str) -> RequestBuilder {
        self.client.post(self.url(path)).bearer_auth(&self.token)
    }

    fn put(&self, path: &str) -> RequestBuilder {
        self.client.put(self.url(path)).bearer_auth(&self.token)
    }

    /// Identifier of the signed-in user
    pub fn current_user_id(&self) -> Result<String, RemoteError> {
        let response = read_json(self.get("/v3/users/me").send()?)?;
        string_at(&response, "/id")
    }

    /// Workspaces the user can upload into, most recently updated first
    pub fn list_workspaces(&self) -> Result<Vec<Workspace>, RemoteError> {
        let workspaces = collect_pages(MAX_WORKSPACE_PAGES, |cursor| {
            let request = self.get("/v3/users/me/workspaces");
            let request = match cursor {
                Some(cursor) => request.query(&[("cursor", cursor)]),
                None => request.query(&[
                    ("pageSize", "100"),
                    ("includeCount", "true"),
                    ("filterBy", "associatedWorkspaces eq false"),
                    ("orderBy", "contentUpdatedAt desc"),
                ]),
            };
            let page = read_json(request.send()?)?;
            let items = page
                .get("workspaces")
                .cloned()
                .ok_or_else(|| RemoteError::malformed("missing workspaces"))?;
            let items: Vec<Workspace> = serde_json::from_value(items)?;
            let next = page.get("next").and_then(Value::as_str).map(str::to_string);
            Ok((items, next))
        })?;
        log::info!("{} workspaces retrieved", workspaces.len());
        Ok(workspaces)
    }

    /// Service bound to one workspace
    pub fn workspace(self, workspace_id: impl Into<String>) -> HttpCanvasService {
        HttpCanvasService {
            api: self,
            workspace_id: workspace_id.into(),
        }
    }
}

/// Canvas service backed by the workspace REST API
#[derive(Debug, Clone)]
pub struct HttpCanvasService {
    api: ApiClient,
    workspace_id: String,
}

impl HttpCanvasService {
    pub fn new(
        config: &ServiceConfig,
        token: impl Into<String>,
        workspace_id: impl Into<String>,
    ) -> Result<Self, RemoteError> {
        Ok(ApiClient::new(config, token)?.workspace(workspace_id))
    }

    pub fn workspace_id(&self) -> &str {
        &self.workspace_id
    }

    fn workspace_path(&self, rest: &str) -> String {
        format!("/v3/workspaces/{}{}", self.workspace_id, rest)
    }

    fn create_element(&self, element: &Value) -> Result<ElementId, RemoteError> {
        let path = self.workspace_path("/elements");
        let response = read_json(self.api.post(&path).json(element).send()?)?;
        Ok(ElementId(string_at(&response, "/data/id")?))
    }

    /// Send the image bytes to the presigned storage form of a new image element
    fn upload_asset(&self, created: &Value, image: &NewImage<'_>) -> Result<(), RemoteError> {
        let url = string_at(created, "/data/content/url")?;
        let mut form = multipart::Form::new();
        for field in UPLOAD_FORM_FIELDS {
            let value = string_at(created, &format!("/data/content/fields/{}", field))?;
            form = form.text(field, value);
        }
        let part = multipart::Part::bytes(image.png.to_vec()).file_name(image.filename.clone());
        form = form.part("file", part);

        // The presigned URL carries its own authorization
        let response = self.api.client.post(url).multipart(form).send()?;
        check_status(response)?;
        Ok(())
    }
}

impl CanvasService for HttpCanvasService {
    fn list_tagged_canvases(&mut self) -> Result<Vec<CanvasRecord>, RemoteError> {
        let path = self.workspace_path("/elements");
        let response = read_json(self.api.get(&path).query(&[("type", "Canvas")]).send()?)?;
        let elements = response
            .get("data")
            .and_then(Value::as_array)
            .ok_or_else(|| RemoteError::malformed("missing data"))?;
        Ok(elements.iter().map(CanvasRecord::from_json).collect())
    }

    fn find_free_area(&mut self, request: &PlacementRequest) -> Result<BoundingBox, RemoteError> {
        let path = self.workspace_path("/findAvailableArea");
        let response = read_json(
            self.api
                .post(&path)
                .json(&body::find_free_area(request))
                .send()?,
        )?;
        Ok(BoundingBox::new(
            coordinate_at(&response, "/x")?,
            coordinate_at(&response, "/y")?,
            coordinate_at(&response, "/width")?,
            coordinate_at(&response, "/height")?,
        ))
    }

    fn create_canvas(&mut self, canvas: &NewCanvas) -> Result<ElementId, RemoteError> {
        self.create_element(&body::canvas(canvas))
    }

    fn create_text_block(&mut self, block: &TextBlock) -> Result<ElementId, RemoteError> {
        self.create_element(&body::text_block(block))
    }

    fn upload_image(&mut self, image: &NewImage<'_>) -> Result<ElementId, RemoteError> {
        let path = self.workspace_path("/elements");
        let created = read_json(self.api.post(&path).json(&body::image(image)).send()?)?;
        let element_id = ElementId(string_at(&created, "/data/id")?);

        self.upload_asset(&created, image)?;

        let upload_id = string_at(&created, "/data/content/uploadId")?;
        let finish = self.workspace_path(&format!("/assets/uploads/{}", upload_id));
        check_status(self.api.put(&finish).json(&json!({})).send()?)?;

        Ok(element_id)
    }
}

/// Error for a response status, or `None` when the request succeeded
fn status_error(status: StatusCode, body: String) -> Option<RemoteError> {
    if status == StatusCode::UNAUTHORIZED {
        return Some(RemoteError::AuthorizationExpired);
    }
    if !status.is_success() {
        return Some(RemoteError::unexpected_status(status.as_u16(), body));
    }
    None
}

/// Map authorization and error statuses, passing successful responses through
fn check_status(response: Response) -> Result<Response, RemoteError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().unwrap_or_default();
    match status_error(status, body) {
        Some(error) => Err(error),
        None => Err(RemoteError::unexpected_status(status.as_u16(), String::new())),
    }
}

fn read_json(response: Response) -> Result<Value, RemoteError> {
    let text = check_status(response)?.text()?;
    Ok(serde_json::from_str(&text)?)
}

fn string_at(value: &Value, pointer: &str) -> Result<String, RemoteError> {
    match value.pointer(pointer) {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(Value::Number(n)) => Ok(n.to_string()),
        _ => Err(RemoteError::malformed(format!("missing {}", pointer))),
    }
}

fn coordinate_at(value: &Value, pointer: &str) -> Result<i64, RemoteError> {
    let field = value
        .pointer(pointer)
        .ok_or_else(|| RemoteError::malformed(format!("missing {}", pointer)))?;
    field
        .as_i64()
        .or_else(|| field.as_f64().map(|f| f.round() as i64))
        .ok_or_else(|| RemoteError::malformed(format!("{} is not a number", pointer)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_at() {
        let value = json!({ "data": { "id": "abc", "n": 5 } });
        assert_eq!(string_at(&value, "/data/id").unwrap(), "abc");
        assert_eq!(string_at(&value, "/data/n").unwrap(), "5");
        assert!(matches!(
            string_at(&value, "/data/missing"),
            Err(RemoteError::MalformedResponse { .. })
        ));
    }

    #[test]
    fn test_coordinate_at() {
        let value = json!({ "x": 10, "y": 20.6, "w": "wide" });
        assert_eq!(coordinate_at(&value, "/x").unwrap(), 10);
        assert_eq!(coordinate_at(&value, "/y").unwrap(), 21);
        assert!(coordinate_at(&value, "/w").is_err());
        assert!(coordinate_at(&value, "/h").is_err());
    }

    #[test]
    fn test_status_error() {
        assert!(status_error(StatusCode::OK, String::new()).is_none());
        assert!(status_error(StatusCode::CREATED, String::new()).is_none());
        assert!(status_error(StatusCode::UNAUTHORIZED, "expired".to_string())
            .is_some_and(|e| e.is_authorization_expired()));
        match status_error(StatusCode::FORBIDDEN, "no access".to_string()) {
            Some(RemoteError::UnexpectedStatus { status, body }) => {
                assert_eq!(status, 403);
                assert_eq!(body, "no access");
            }
            other => panic!("expected unexpected status, got {:?}", other),
        }
    }

    #[test]
    fn test_workspace_paths() {
        let config = ServiceConfig {
            api_base_url: "https://api.example.com/".to_string(),
            ..ServiceConfig::default()
        };
        let service = HttpCanvasService::new(&config, "token", "ws-1").unwrap();
        assert_eq!(service.workspace_id(), "ws-1");
        assert_eq!(
            service.api.url(&service.workspace_path("/elements")),
            "https://api.example.com/v3/workspaces/ws-1/elements"
        );
    }
}
