// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Scanwerk capture-to-recognition pipeline.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Image references and capture requests
// ---------------------------------------------------------------------------

/// Opaque locator for photographic data written by the camera collaborator.
///
/// Accepts either a `file://` URI or a bare filesystem path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageReference(String);

impl ImageReference {
    pub fn new(locator: impl Into<String>) -> Self {
        Self(locator.into())
    }

    /// Build a `file://` reference from a filesystem path.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self(format!("file://{}", path.into().display()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Resolve the reference to a local filesystem path.
    pub fn to_path(&self) -> PathBuf {
        PathBuf::from(self.0.strip_prefix("file://").unwrap_or(&self.0))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for ImageReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Correlates a capture request with its single completion event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(pub Uuid);

impl RequestId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Ask the camera collaborator to write a photo to `reference`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureRequest {
    pub id: RequestId,
    pub reference: ImageReference,
}

/// How the camera collaborator returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureOutcome {
    /// Image bytes were written to the requested reference.
    Saved,
    /// The user backed out of the camera; nothing was written.
    Cancelled,
    /// The collaborator failed; nothing usable was written.
    Failed(String),
}

/// The single completion event for a [`CaptureRequest`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureCompletion {
    pub id: RequestId,
    pub outcome: CaptureOutcome,
}

/// Result of the runtime permission dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionOutcome {
    Granted,
    Denied,
}

// ---------------------------------------------------------------------------
// Raw detector output
// ---------------------------------------------------------------------------

/// Barcode symbology a detection was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BarcodeFormat {
    QrCode,
    DataMatrix,
    Aztec,
    Pdf417,
    Ean13,
    Ean8,
    UpcA,
    UpcE,
    Code128,
    Code39,
    Code93,
    Codabar,
    Itf,
}

impl BarcodeFormat {
    /// Parse the snake_case name used in configuration and on the CLI.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().replace('-', "_").as_str() {
            "qr_code" | "qr" => Some(Self::QrCode),
            "data_matrix" => Some(Self::DataMatrix),
            "aztec" => Some(Self::Aztec),
            "pdf417" => Some(Self::Pdf417),
            "ean13" | "ean_13" => Some(Self::Ean13),
            "ean8" | "ean_8" => Some(Self::Ean8),
            "upc_a" => Some(Self::UpcA),
            "upc_e" => Some(Self::UpcE),
            "code128" | "code_128" => Some(Self::Code128),
            "code39" | "code_39" => Some(Self::Code39),
            "code93" | "code_93" => Some(Self::Code93),
            "codabar" => Some(Self::Codabar),
            "itf" => Some(Self::Itf),
            _ => None,
        }
    }
}

/// Value-format tag attached to a detection by the detector engine.
///
/// The tag space is open: engines may report codes this crate does not know,
/// and those classify as `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValueTag(pub u32);

impl ValueTag {
    pub const CONTACT_INFO: Self = Self(1);
    pub const EMAIL: Self = Self(2);
    pub const ISBN: Self = Self(3);
    pub const PHONE: Self = Self(4);
    pub const PRODUCT: Self = Self(5);
    pub const SMS: Self = Self(6);
    pub const TEXT: Self = Self(7);
    pub const URL: Self = Self(8);
    pub const WIFI: Self = Self(9);
    pub const GEO: Self = Self(10);
    pub const CALENDAR_EVENT: Self = Self(11);
    pub const DRIVER_LICENSE: Self = Self(12);

    /// The known kind for this tag, or `None` for codes outside the closed set.
    pub fn kind(self) -> Option<ValueKind> {
        ValueKind::ALL.into_iter().find(|kind| kind.tag() == self)
    }
}

impl std::fmt::Display for ValueTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.kind() {
            Some(kind) => f.write_str(kind.name()),
            None => write!(f, "UNKNOWN({})", self.0),
        }
    }
}

/// The closed set of value formats the classifier understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    ContactInfo,
    Email,
    Isbn,
    Phone,
    Product,
    Sms,
    Text,
    Url,
    Wifi,
    Geo,
    CalendarEvent,
    DriverLicense,
}

impl ValueKind {
    pub const ALL: [Self; 12] = [
        Self::ContactInfo,
        Self::Email,
        Self::Isbn,
        Self::Phone,
        Self::Product,
        Self::Sms,
        Self::Text,
        Self::Url,
        Self::Wifi,
        Self::Geo,
        Self::CalendarEvent,
        Self::DriverLicense,
    ];

    pub fn tag(self) -> ValueTag {
        match self {
            Self::ContactInfo => ValueTag::CONTACT_INFO,
            Self::Email => ValueTag::EMAIL,
            Self::Isbn => ValueTag::ISBN,
            Self::Phone => ValueTag::PHONE,
            Self::Product => ValueTag::PRODUCT,
            Self::Sms => ValueTag::SMS,
            Self::Text => ValueTag::TEXT,
            Self::Url => ValueTag::URL,
            Self::Wifi => ValueTag::WIFI,
            Self::Geo => ValueTag::GEO,
            Self::CalendarEvent => ValueTag::CALENDAR_EVENT,
            Self::DriverLicense => ValueTag::DRIVER_LICENSE,
        }
    }

    /// Upper-case name used in logs.
    pub fn name(self) -> &'static str {
        match self {
            Self::ContactInfo => "CONTACT_INFO",
            Self::Email => "EMAIL",
            Self::Isbn => "ISBN",
            Self::Phone => "PHONE",
            Self::Product => "PRODUCT",
            Self::Sms => "SMS",
            Self::Text => "TEXT",
            Self::Url => "URL",
            Self::Wifi => "WIFI",
            Self::Geo => "GEO",
            Self::CalendarEvent => "CALENDAR_EVENT",
            Self::DriverLicense => "DRIVER_LICENSE",
        }
    }
}

/// Structured contact card (vCard / MECARD).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContactInfo {
    pub title: Option<String>,
    pub name: Option<String>,
    pub organization: Option<String>,
    pub phones: Vec<String>,
    pub emails: Vec<String>,
    pub urls: Vec<String>,
    pub addresses: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailMessage {
    pub address: String,
    pub subject: Option<String>,
    pub body: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhoneNumber {
    pub number: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmsMessage {
    pub phone_number: String,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrlBookmark {
    pub title: Option<String>,
    pub url: String,
}

/// Wi-Fi network encryption advertised by a `WIFI:` payload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WifiEncryption {
    #[default]
    Open,
    Wep,
    Wpa,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WifiCredentials {
    pub ssid: String,
    pub password: Option<String>,
    pub encryption: WifiEncryption,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub summary: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub organizer: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
}

/// Fields read from an AAMVA driver-license barcode.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriverLicense {
    pub license_number: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub birth_date: Option<String>,
    pub expiry_date: Option<String>,
    pub issuing_country: Option<String>,
}

/// Type-specific structured fields reported alongside a detection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DetectionFields {
    #[default]
    None,
    ContactInfo(ContactInfo),
    Email(EmailMessage),
    Phone(PhoneNumber),
    Sms(SmsMessage),
    Url(UrlBookmark),
    Wifi(WifiCredentials),
    Geo(GeoPoint),
    CalendarEvent(CalendarEvent),
    DriverLicense(DriverLicense),
}

/// Unclassified output of the detector for one located code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawDetection {
    pub format: BarcodeFormat,
    pub value_tag: ValueTag,
    /// Decoded payload exactly as read from the symbol.
    pub raw_value: String,
    /// Payload as it should be shown to the user.
    pub display_value: String,
    pub fields: DetectionFields,
}

impl RawDetection {
    /// A detection whose display value equals its raw value.
    pub fn new(
        format: BarcodeFormat,
        value_tag: ValueTag,
        raw_value: impl Into<String>,
        fields: DetectionFields,
    ) -> Self {
        let raw_value = raw_value.into();
        Self {
            format,
            value_tag,
            display_value: raw_value.clone(),
            raw_value,
            fields,
        }
    }
}

// ---------------------------------------------------------------------------
// Session state
// ---------------------------------------------------------------------------

/// Which failure put a capture cycle into the `Error` phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    CaptureAborted,
    ImageUnavailable,
    DecodeFailed,
    DetectorUnavailable,
}

/// Lifecycle phases of a capture cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Idle,
    /// Waiting on the runtime permission dialog.
    AwaitingPermission,
    PermissionGranted,
    /// The camera collaborator owns control until it returns.
    Capturing,
    CaptureComplete,
    Decoding,
    ResultsReady,
    /// Decode succeeded but nothing was detected.
    ClassificationEmpty,
    PermissionDenied,
    Error(FailureKind),
}

impl Phase {
    /// Phases from which a fresh capture request starts a new cycle.
    pub fn is_idle_equivalent(self) -> bool {
        matches!(
            self,
            Self::Idle
                | Self::PermissionDenied
                | Self::Error(_)
                | Self::ResultsReady
                | Self::ClassificationEmpty
        )
    }

    /// Phases that belong to an in-flight cycle and never survive suspension.
    pub fn is_in_flight(self) -> bool {
        !self.is_idle_equivalent()
    }

    /// The phase to show after a suspend/resume round trip.
    pub fn display_equivalent(self) -> Self {
        if self.is_in_flight() { Self::Idle } else { self }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::AwaitingPermission => "awaiting_permission",
            Self::PermissionGranted => "permission_granted",
            Self::Capturing => "capturing",
            Self::CaptureComplete => "capture_complete",
            Self::Decoding => "decoding",
            Self::ResultsReady => "results_ready",
            Self::ClassificationEmpty => "classification_empty",
            Self::PermissionDenied => "permission_denied",
            Self::Error(_) => "error",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// The value threaded through the capture state machine and persisted across
/// suspension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    pub image_reference: Option<ImageReference>,
    pub result_text: String,
    pub phase: Phase,
    /// Identifier of the outstanding capture request, if any. Never persisted.
    pub pending_request: Option<RequestId>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            image_reference: None,
            result_text: String::new(),
            phase: Phase::Idle,
            pending_request: None,
        }
    }
}
