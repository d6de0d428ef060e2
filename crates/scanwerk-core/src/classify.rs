// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Result classifier: maps raw detector output onto a closed set of typed
// records and folds their display values into the session's result text.
//
// Structured extraction depends on the value-format tag. Display text never
// does: it is always the detection's display value.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::types::{
    ContactInfo, DetectionFields, RawDetection, ValueKind, ValueTag, WifiEncryption,
};

/// Result text when a decode succeeds but the detector finds nothing.
pub const NOTHING_FOUND_TEXT: &str = "Scan Failed: Found nothing to scan";

/// Result text when the detector cannot be used.
pub const DETECTOR_UNAVAILABLE_TEXT: &str = "Could not set up the detector!";

/// A detection classified by its value-format tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClassifiedRecord {
    ContactInfo {
        title: String,
        contact: ContactInfo,
        display_value: String,
    },
    Email {
        address: String,
        display_value: String,
    },
    Isbn {
        value: String,
        display_value: String,
    },
    Phone {
        number: String,
        display_value: String,
    },
    Product {
        value: String,
        display_value: String,
    },
    Sms {
        message: String,
        display_value: String,
    },
    Text {
        value: String,
        display_value: String,
    },
    Url {
        url: String,
        display_value: String,
    },
    Wifi {
        ssid: String,
        password: Option<String>,
        encryption: WifiEncryption,
        display_value: String,
    },
    Geo {
        lat: f64,
        lng: f64,
        display_value: String,
    },
    CalendarEvent {
        description: String,
        display_value: String,
    },
    DriverLicense {
        license_number: String,
        display_value: String,
    },
    Unknown {
        tag: ValueTag,
        raw_value: String,
        display_value: String,
    },
}

impl ClassifiedRecord {
    /// The value shown to the user, identical for every variant.
    pub fn display_value(&self) -> &str {
        match self {
            Self::ContactInfo { display_value, .. }
            | Self::Email { display_value, .. }
            | Self::Isbn { display_value, .. }
            | Self::Phone { display_value, .. }
            | Self::Product { display_value, .. }
            | Self::Sms { display_value, .. }
            | Self::Text { display_value, .. }
            | Self::Url { display_value, .. }
            | Self::Wifi { display_value, .. }
            | Self::Geo { display_value, .. }
            | Self::CalendarEvent { display_value, .. }
            | Self::DriverLicense { display_value, .. }
            | Self::Unknown { display_value, .. } => display_value,
        }
    }

    /// The known kind of this record, `None` for `Unknown`.
    pub fn kind(&self) -> Option<ValueKind> {
        match self {
            Self::ContactInfo { .. } => Some(ValueKind::ContactInfo),
            Self::Email { .. } => Some(ValueKind::Email),
            Self::Isbn { .. } => Some(ValueKind::Isbn),
            Self::Phone { .. } => Some(ValueKind::Phone),
            Self::Product { .. } => Some(ValueKind::Product),
            Self::Sms { .. } => Some(ValueKind::Sms),
            Self::Text { .. } => Some(ValueKind::Text),
            Self::Url { .. } => Some(ValueKind::Url),
            Self::Wifi { .. } => Some(ValueKind::Wifi),
            Self::Geo { .. } => Some(ValueKind::Geo),
            Self::CalendarEvent { .. } => Some(ValueKind::CalendarEvent),
            Self::DriverLicense { .. } => Some(ValueKind::DriverLicense),
            Self::Unknown { .. } => None,
        }
    }

    /// Log label for the variant.
    pub fn kind_name(&self) -> &'static str {
        self.kind().map_or("unknown", ValueKind::name)
    }

    /// The structured payload rendered for logs.
    pub fn payload(&self) -> String {
        match self {
            Self::ContactInfo { title, .. } => title.clone(),
            Self::Email { address, .. } => address.clone(),
            Self::Isbn { value, .. } | Self::Product { value, .. } | Self::Text { value, .. } => {
                value.clone()
            }
            Self::Phone { number, .. } => number.clone(),
            Self::Sms { message, .. } => message.clone(),
            Self::Url { url, .. } => format!("url: {url}"),
            Self::Wifi { ssid, .. } => ssid.clone(),
            Self::Geo { lat, lng, .. } => format!("{lat} : {lng}"),
            Self::CalendarEvent { description, .. } => description.clone(),
            Self::DriverLicense { license_number, .. } => license_number.clone(),
            Self::Unknown { raw_value, .. } => raw_value.clone(),
        }
    }
}

/// Classify one raw detection. Total: every tag yields exactly one record.
///
/// A known tag whose structured fields are missing (or of another kind) still
/// yields its variant, with the primary string taken from the raw value.
pub fn classify(raw: &RawDetection) -> ClassifiedRecord {
    let display_value = raw.display_value.clone();
    let raw_value = raw.raw_value.clone();

    let record = match raw.value_tag.kind() {
        Some(ValueKind::ContactInfo) => {
            let contact = match &raw.fields {
                DetectionFields::ContactInfo(contact) => contact.clone(),
                _ => ContactInfo::default(),
            };
            let title = contact
                .title
                .clone()
                .or_else(|| contact.name.clone())
                .unwrap_or(raw_value);
            ClassifiedRecord::ContactInfo {
                title,
                contact,
                display_value,
            }
        }
        Some(ValueKind::Email) => {
            let address = match &raw.fields {
                DetectionFields::Email(email) => email.address.clone(),
                _ => raw_value,
            };
            ClassifiedRecord::Email {
                address,
                display_value,
            }
        }
        Some(ValueKind::Isbn) => ClassifiedRecord::Isbn {
            value: raw_value,
            display_value,
        },
        Some(ValueKind::Phone) => {
            let number = match &raw.fields {
                DetectionFields::Phone(phone) => phone.number.clone(),
                _ => raw_value,
            };
            ClassifiedRecord::Phone {
                number,
                display_value,
            }
        }
        Some(ValueKind::Product) => ClassifiedRecord::Product {
            value: raw_value,
            display_value,
        },
        Some(ValueKind::Sms) => {
            let message = match &raw.fields {
                DetectionFields::Sms(sms) => sms.message.clone(),
                _ => raw_value,
            };
            ClassifiedRecord::Sms {
                message,
                display_value,
            }
        }
        Some(ValueKind::Text) => ClassifiedRecord::Text {
            value: raw_value,
            display_value,
        },
        Some(ValueKind::Url) => {
            let url = match &raw.fields {
                DetectionFields::Url(bookmark) => bookmark.url.clone(),
                _ => raw_value,
            };
            ClassifiedRecord::Url { url, display_value }
        }
        Some(ValueKind::Wifi) => match &raw.fields {
            DetectionFields::Wifi(wifi) => ClassifiedRecord::Wifi {
                ssid: wifi.ssid.clone(),
                password: wifi.password.clone(),
                encryption: wifi.encryption,
                display_value,
            },
            _ => ClassifiedRecord::Wifi {
                ssid: raw_value,
                password: None,
                encryption: WifiEncryption::Open,
                display_value,
            },
        },
        Some(ValueKind::Geo) => {
            let (lat, lng) = match &raw.fields {
                DetectionFields::Geo(point) => (point.lat, point.lng),
                _ => (0.0, 0.0),
            };
            ClassifiedRecord::Geo {
                lat,
                lng,
                display_value,
            }
        }
        Some(ValueKind::CalendarEvent) => {
            let description = match &raw.fields {
                DetectionFields::CalendarEvent(event) => event
                    .description
                    .clone()
                    .or_else(|| event.summary.clone())
                    .unwrap_or(raw_value),
                _ => raw_value,
            };
            ClassifiedRecord::CalendarEvent {
                description,
                display_value,
            }
        }
        Some(ValueKind::DriverLicense) => {
            let license_number = match &raw.fields {
                DetectionFields::DriverLicense(license) => license.license_number.clone(),
                _ => raw_value,
            };
            ClassifiedRecord::DriverLicense {
                license_number,
                display_value,
            }
        }
        None => ClassifiedRecord::Unknown {
            tag: raw.value_tag,
            raw_value,
            display_value,
        },
    };

    info!(
        kind = record.kind_name(),
        payload = %record.payload(),
        "Detection classified"
    );
    record
}

/// The line appended to the result text for a record.
pub fn summary_line(record: &ClassifiedRecord) -> String {
    record.display_value().to_owned()
}

/// Fold a cycle's records into the running result text.
///
/// Each summary line is appended after a single space. Zero records replace
/// whatever was there with [`NOTHING_FOUND_TEXT`].
pub fn accumulate_results(prior: &str, records: &[ClassifiedRecord]) -> String {
    if records.is_empty() {
        return NOTHING_FOUND_TEXT.to_owned();
    }
    records.iter().fold(prior.to_owned(), |mut text, record| {
        text.push(' ');
        text.push_str(&summary_line(record));
        text
    })
}
