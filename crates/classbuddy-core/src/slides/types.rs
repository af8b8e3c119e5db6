//! Wire shapes for the presentation-generation API.

use serde::{Deserialize, Serialize};

/// Body of `POST /generations`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    pub input_text: String,
    pub text_mode: String,
    pub format: String,
    pub num_cards: u32,
    pub export_as: String,
}

impl GenerationRequest {
    pub fn presentation(input_text: String, num_cards: u32) -> Self {
        Self {
            input_text,
            text_mode: "generate".to_string(),
            format: "presentation".to_string(),
            num_cards,
            export_as: ExportFormat::Pptx.as_str().to_string(),
        }
    }
}

/// Reply to `POST /generations`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedGeneration {
    #[serde(default)]
    pub generation_id: Option<String>,
}

/// Job status as reported by the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationStatus {
    Pending,
    Completed,
    Failed,
    /// Any status string this client does not know. Treated as pending.
    #[serde(other)]
    Unknown,
}

/// Reply to `GET /generations/{id}`. Blank URLs are treated as absent.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "RawGenerationSnapshot")]
pub struct GenerationSnapshot {
    pub status: GenerationStatus,
    pub gamma_url: Option<String>,
    pub pptx_url: Option<String>,
    pub pdf_url: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawGenerationSnapshot {
    status: GenerationStatus,
    #[serde(default)]
    gamma_url: Option<String>,
    #[serde(default)]
    pptx_url: Option<String>,
    #[serde(default)]
    pdf_url: Option<String>,
}

impl From<RawGenerationSnapshot> for GenerationSnapshot {
    fn from(raw: RawGenerationSnapshot) -> Self {
        Self {
            status: raw.status,
            gamma_url: non_empty(raw.gamma_url),
            pptx_url: non_empty(raw.pptx_url),
            pdf_url: non_empty(raw.pdf_url),
        }
    }
}

/// File format requested from the export endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Pptx,
}

impl ExportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pptx => "pptx",
        }
    }
}

/// Reply to `POST /generations/{id}/export`: either the file is ready now or
/// there is an export job to poll.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawExportTicket")]
pub enum ExportTicket {
    Ready(String),
    Pending(String),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawExportTicket {
    #[serde(default)]
    export_id: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    download_url: Option<String>,
}

impl TryFrom<RawExportTicket> for ExportTicket {
    type Error = String;

    fn try_from(raw: RawExportTicket) -> Result<Self, Self::Error> {
        if let Some(url) = non_empty(raw.url).or(non_empty(raw.download_url)) {
            return Ok(Self::Ready(url));
        }
        match non_empty(raw.export_id) {
            Some(id) => Ok(Self::Pending(id)),
            None => Err("export reply has neither a URL nor an exportId".to_string()),
        }
    }
}

/// Reply to `GET /generations/{id}/exports/{exportId}`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "RawExportSnapshot")]
pub struct ExportSnapshot {
    pub status: GenerationStatus,
    pub url: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawExportSnapshot {
    status: GenerationStatus,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    download_url: Option<String>,
}

impl From<RawExportSnapshot> for ExportSnapshot {
    fn from(raw: RawExportSnapshot) -> Self {
        Self {
            status: raw.status,
            url: non_empty(raw.url).or(non_empty(raw.download_url)),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

/// Links to the finished deck. Absent links serialize as `null`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlideDeckLinks {
    pub gamma_url: Option<String>,
    pub pptx_url: Option<String>,
    pub pdf_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_status_falls_back() {
        let snap: GenerationSnapshot =
            serde_json::from_str(r#"{"status":"processing"}"#).unwrap();
        assert_eq!(snap.status, GenerationStatus::Unknown);

        let snap: GenerationSnapshot = serde_json::from_str(
            r#"{"status":"completed","gammaUrl":"https://gamma.app/d/1","pptxUrl":"https://x/1.pptx"}"#,
        )
        .unwrap();
        assert_eq!(snap.status, GenerationStatus::Completed);
        assert_eq!(snap.pptx_url.as_deref(), Some("https://x/1.pptx"));
        assert!(snap.pdf_url.is_none());
    }

    #[test]
    fn blank_snapshot_urls_are_absent() {
        let snap: GenerationSnapshot = serde_json::from_str(
            r#"{"status":"completed","gammaUrl":"https://g","pptxUrl":"","pdfUrl":"  "}"#,
        )
        .unwrap();
        assert_eq!(snap.gamma_url.as_deref(), Some("https://g"));
        assert!(snap.pptx_url.is_none());
        assert!(snap.pdf_url.is_none());
    }

    #[test]
    fn request_body_uses_camel_case() {
        let value =
            serde_json::to_value(GenerationRequest::presentation("# Aula".to_string(), 7)).unwrap();
        assert_eq!(value["inputText"], "# Aula");
        assert_eq!(value["textMode"], "generate");
        assert_eq!(value["format"], "presentation");
        assert_eq!(value["numCards"], 7);
        assert_eq!(value["exportAs"], "pptx");
    }

    #[test]
    fn export_ticket_prefers_direct_url() {
        let t: ExportTicket =
            serde_json::from_str(r#"{"exportId":"e1","downloadUrl":"https://x/d.pptx"}"#).unwrap();
        assert_eq!(t, ExportTicket::Ready("https://x/d.pptx".to_string()));

        let t: ExportTicket = serde_json::from_str(r#"{"exportId":"e1"}"#).unwrap();
        assert_eq!(t, ExportTicket::Pending("e1".to_string()));

        assert!(serde_json::from_str::<ExportTicket>(r#"{"exportId":""}"#).is_err());
    }

    #[test]
    fn export_snapshot_merges_url_fields() {
        let s: ExportSnapshot =
            serde_json::from_str(r#"{"status":"completed","downloadUrl":"https://x/e.pptx"}"#)
                .unwrap();
        assert_eq!(s.url.as_deref(), Some("https://x/e.pptx"));
    }

    #[test]
    fn links_serialize_missing_urls_as_null() {
        let links = SlideDeckLinks {
            gamma_url: Some("https://gamma.app/d/1".to_string()),
            ..SlideDeckLinks::default()
        };
        let value = serde_json::to_value(&links).unwrap();
        assert_eq!(value["gammaUrl"], "https://gamma.app/d/1");
        assert!(value["pptxUrl"].is_null());
        assert!(value.as_object().unwrap().contains_key("pdfUrl"));
    }
}
