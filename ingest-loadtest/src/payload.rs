//! The analytics event posted on every iteration.
//!
//! Field names, nesting and order are what the ingestion endpoint expects and must not change.
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IngestRequest {
    pub api_key: &'static str,
    pub events: Vec<Event>,
    pub options: RequestOptions,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Event {
    pub device_id: &'static str,
    pub session_id: u64,
    pub time: u64,
    pub platform: &'static str,
    pub os_name: &'static str,
    pub os_version: &'static str,
    pub device_model: &'static str,
    pub language: &'static str,
    /// Filled in with the caller's address by the endpoint, sent verbatim.
    pub ip: &'static str,
    pub insert_id: &'static str,
    pub event_type: &'static str,
    pub event_properties: EventProperties,
    pub event_id: u64,
    pub library: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventProperties {
    pub utm_campaign: &'static str,
    pub utm_medium: &'static str,
    pub utm_source: &'static str,
    pub referrer: &'static str,
    pub referring_domain: &'static str,
    #[serde(rename = "[Amplitude] Page Domain")]
    pub page_domain: &'static str,
    #[serde(rename = "[Amplitude] Page Location")]
    pub page_location: &'static str,
    #[serde(rename = "[Amplitude] Page Path")]
    pub page_path: &'static str,
    #[serde(rename = "[Amplitude] Page Title")]
    pub page_title: &'static str,
    #[serde(rename = "[Amplitude] Page URL")]
    pub page_url: &'static str,
}

/// Always serialized as an empty object.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RequestOptions {}

pub fn request_template() -> IngestRequest {
    IngestRequest {
        api_key: "7883e1a1c733f2cfdf634b71f523ae67",
        events: vec![Event {
            device_id: "PROXYPROXYPROXY",
            session_id: 1727432370360,
            time: 1727432412393,
            platform: "CARL",
            os_name: "CARL",
            os_version: "CARL",
            device_model: "CARL",
            language: "nb-NO",
            ip: "$remote",
            insert_id: "98c6079b-1868-4d5d-8f23-725a7f5a4bf8",
            event_type: "[Amplitude] PROXYPROXYPROXY",
            event_properties: EventProperties {
                utm_campaign: "23031510135",
                utm_medium: "23031510135",
                utm_source: "23031510135",
                referrer: "https://login.microsoftonline.com/",
                referring_domain: "login.microsoftonline.com",
                page_domain: "lekk.ansatt.nav.no",
                page_location: "https://lekk.ansatt.nav.no/profil/kari-nordmann/23031510135?name=kari-nordmann&fnr=23031510135&utm_source=23031510135&utm_medium=23031510135&utm_campaign=23031510135",
                page_path: "/profil/kari-nordmann/23031510135",
                page_title: "Lekk - Kari Nordmann (fnr: 23031510135)",
                page_url: "https://lekk.ansatt.nav.no/profil/kari-nordmann/23031510135",
            },
            event_id: 0,
            library: "amplitude-ts/1.9.1",
        }],
        options: RequestOptions {},
    }
}

/// Serialize a freshly built template.
pub fn payload() -> serde_json::Result<String> {
    serde_json::to_string(&request_template())
}
