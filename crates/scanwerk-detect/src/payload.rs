// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Payload parser. Infers the value format of decoded barcode text and pulls
// out its structured fields.
//
// Recognised encodings:
//   vCard / MECARD            -> CONTACT_INFO
//   mailto: / MATMSG:         -> EMAIL
//   978/979 EAN-13            -> ISBN
//   tel:                      -> PHONE
//   EAN-8 / UPC-A / EAN-13    -> PRODUCT
//   sms: / smsto:             -> SMS
//   http(s):// / MEBKM:       -> URL
//   WIFI:                     -> WIFI
//   geo:                      -> GEO
//   iCalendar VEVENT/VCALENDAR -> CALENDAR_EVENT
//   AAMVA (`@` ... `ANSI `)   -> DRIVER_LICENSE
//   anything else             -> TEXT

use scanwerk_core::types::{
    BarcodeFormat, CalendarEvent, ContactInfo, DetectionFields, DriverLicense, EmailMessage,
    GeoPoint, PhoneNumber, RawDetection, SmsMessage, UrlBookmark, ValueTag, WifiCredentials,
    WifiEncryption,
};

/// Tag decoded `content` with its value format and structured fields.
pub fn parse_payload(format: BarcodeFormat, content: &str) -> RawDetection {
    let (tag, fields) = infer(content.trim());
    RawDetection::new(format, tag, content, fields)
}

fn infer(text: &str) -> (ValueTag, DetectionFields) {
    if let Some(contact) = parse_vcard(text).or_else(|| parse_mecard(text)) {
        return (ValueTag::CONTACT_INFO, DetectionFields::ContactInfo(contact));
    }
    if let Some(event) = parse_vevent(text) {
        return (ValueTag::CALENDAR_EVENT, DetectionFields::CalendarEvent(event));
    }
    if let Some(email) = parse_mailto(text).or_else(|| parse_matmsg(text)) {
        return (ValueTag::EMAIL, DetectionFields::Email(email));
    }
    if let Some(rest) = strip_prefix_ci(text, "tel:") {
        let phone = PhoneNumber {
            number: rest.trim().to_owned(),
        };
        return (ValueTag::PHONE, DetectionFields::Phone(phone));
    }
    if let Some(sms) = parse_sms(text) {
        return (ValueTag::SMS, DetectionFields::Sms(sms));
    }
    if let Some(bookmark) = parse_url(text) {
        return (ValueTag::URL, DetectionFields::Url(bookmark));
    }
    if let Some(wifi) = parse_wifi(text) {
        return (ValueTag::WIFI, DetectionFields::Wifi(wifi));
    }
    if let Some(point) = parse_geo(text) {
        return (ValueTag::GEO, DetectionFields::Geo(point));
    }
    if let Some(license) = parse_aamva(text) {
        return (ValueTag::DRIVER_LICENSE, DetectionFields::DriverLicense(license));
    }
    if is_isbn(text) {
        return (ValueTag::ISBN, DetectionFields::None);
    }
    if is_product_code(text) {
        return (ValueTag::PRODUCT, DetectionFields::None);
    }
    (ValueTag::TEXT, DetectionFields::None)
}

// ---------------------------------------------------------------------------
// Contacts
// ---------------------------------------------------------------------------

fn parse_vcard(text: &str) -> Option<ContactInfo> {
    strip_prefix_ci(text, "BEGIN:VCARD")?;
    let mut contact = ContactInfo::default();
    for (key, value) in content_lines(text) {
        match key.as_str() {
            "FN" => contact.name = Some(value),
            "N" if contact.name.is_none() => contact.name = Some(structured_name(&value)),
            "TITLE" => contact.title = Some(value),
            "ORG" => contact.organization = Some(value.replace(';', " ").trim().to_owned()),
            "TEL" => contact.phones.push(value),
            "EMAIL" => contact.emails.push(value),
            "URL" => contact.urls.push(value),
            "ADR" => contact.addresses.push(address(&value)),
            _ => {}
        }
    }
    Some(contact)
}

fn parse_mecard(text: &str) -> Option<ContactInfo> {
    let body = strip_prefix_ci(text, "MECARD:")?;
    let mut contact = ContactInfo::default();
    for (key, value) in mecard_fields(body) {
        match key.as_str() {
            "N" => contact.name = Some(structured_name(&value.replace(',', ";"))),
            "TEL" => contact.phones.push(value),
            "EMAIL" => contact.emails.push(value),
            "URL" => contact.urls.push(value),
            "ADR" => contact.addresses.push(address(&value)),
            "ORG" => contact.organization = Some(value),
            "TITLE" => contact.title = Some(value),
            _ => {}
        }
    }
    Some(contact)
}

/// `Family;Given;Additional;Prefix;Suffix` -> `Prefix Given Additional Family Suffix`.
fn structured_name(value: &str) -> String {
    let parts: Vec<&str> = value.split(';').collect();
    let pick = |i: usize| parts.get(i).copied().unwrap_or("").trim();
    [pick(3), pick(1), pick(2), pick(0), pick(4)]
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn address(value: &str) -> String {
    value
        .split(';')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
}

// ---------------------------------------------------------------------------
// Calendar events
// ---------------------------------------------------------------------------

fn parse_vevent(text: &str) -> Option<CalendarEvent> {
    let upper = text.to_ascii_uppercase();
    if !upper.contains("BEGIN:VEVENT") && !upper.starts_with("BEGIN:VCALENDAR") {
        return None;
    }
    let mut event = CalendarEvent::default();
    for (key, value) in content_lines(text) {
        match key.as_str() {
            "SUMMARY" => event.summary = Some(value),
            "DESCRIPTION" => event.description = Some(value),
            "LOCATION" => event.location = Some(value),
            "ORGANIZER" => {
                let organizer = strip_prefix_ci(&value, "mailto:").unwrap_or(&value).to_owned();
                event.organizer = Some(organizer);
            }
            "DTSTART" => event.start = Some(value),
            "DTEND" => event.end = Some(value),
            _ => {}
        }
    }
    Some(event)
}

/// Iterate `KEY;PARAMS:VALUE` content lines, yielding the upper-cased key and
/// the value. Folded continuation lines are joined first.
fn content_lines(text: &str) -> Vec<(String, String)> {
    let mut unfolded: Vec<String> = Vec::new();
    for line in text.lines() {
        let line = line.trim_end_matches('\r');
        match (line.strip_prefix(' ').or_else(|| line.strip_prefix('\t')), unfolded.last_mut()) {
            (Some(continuation), Some(previous)) => previous.push_str(continuation),
            _ => unfolded.push(line.to_owned()),
        }
    }

    unfolded
        .into_iter()
        .filter_map(|line| {
            let (head, value) = line.split_once(':')?;
            let key = head.split(';').next().unwrap_or(head).trim().to_ascii_uppercase();
            Some((key, value.trim().to_owned()))
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Email, phone, SMS
// ---------------------------------------------------------------------------

fn parse_mailto(text: &str) -> Option<EmailMessage> {
    let rest = strip_prefix_ci(text, "mailto:")?;
    let (address, query) = match rest.split_once('?') {
        Some((address, query)) => (address, Some(query)),
        None => (rest, None),
    };
    let mut email = EmailMessage {
        address: percent_decode(address),
        ..Default::default()
    };
    for (key, value) in query.into_iter().flat_map(query_pairs) {
        match key.to_ascii_lowercase().as_str() {
            "subject" => email.subject = Some(value),
            "body" => email.body = Some(value),
            "to" if email.address.is_empty() => email.address = value,
            _ => {}
        }
    }
    Some(email)
}

fn parse_matmsg(text: &str) -> Option<EmailMessage> {
    let body = strip_prefix_ci(text, "MATMSG:")?;
    let mut email = EmailMessage::default();
    for (key, value) in mecard_fields(body) {
        match key.as_str() {
            "TO" => email.address = value,
            "SUB" => email.subject = Some(value),
            "BODY" => email.body = Some(value),
            _ => {}
        }
    }
    Some(email)
}

fn parse_sms(text: &str) -> Option<SmsMessage> {
    if let Some(rest) = strip_prefix_ci(text, "smsto:") {
        let (number, message) = rest.split_once(':').unwrap_or((rest, ""));
        return Some(SmsMessage {
            phone_number: number.trim().to_owned(),
            message: message.to_owned(),
        });
    }
    let rest = strip_prefix_ci(text, "sms:")?;
    let (number, query) = rest.split_once('?').unwrap_or((rest, ""));
    let message = query_pairs(query)
        .into_iter()
        .find(|(key, _)| key.eq_ignore_ascii_case("body"))
        .map(|(_, value)| value)
        .unwrap_or_default();
    Some(SmsMessage {
        phone_number: number.trim().to_owned(),
        message,
    })
}

// ---------------------------------------------------------------------------
// URLs, Wi-Fi, geo
// ---------------------------------------------------------------------------

fn parse_url(text: &str) -> Option<UrlBookmark> {
    if let Some(body) = strip_prefix_ci(text, "MEBKM:") {
        let mut bookmark = UrlBookmark::default();
        for (key, value) in mecard_fields(body) {
            match key.as_str() {
                "TITLE" => bookmark.title = Some(value),
                "URL" => bookmark.url = value,
                _ => {}
            }
        }
        return (!bookmark.url.is_empty()).then_some(bookmark);
    }
    if let Some(rest) = strip_prefix_ci(text, "URLTO:") {
        let (title, url) = rest.split_once(':')?;
        return Some(UrlBookmark {
            title: (!title.is_empty()).then(|| title.to_owned()),
            url: url.to_owned(),
        });
    }
    let is_web = strip_prefix_ci(text, "http://").is_some() || strip_prefix_ci(text, "https://").is_some();
    (is_web && !text.contains(char::is_whitespace)).then(|| UrlBookmark {
        title: None,
        url: text.to_owned(),
    })
}

fn parse_wifi(text: &str) -> Option<WifiCredentials> {
    let body = strip_prefix_ci(text, "WIFI:")?;
    let mut wifi = WifiCredentials::default();
    for (key, value) in mecard_fields(body) {
        match key.as_str() {
            "S" => wifi.ssid = value,
            "P" if !value.is_empty() => wifi.password = Some(value),
            "T" => {
                wifi.encryption = match value.to_ascii_uppercase().as_str() {
                    "WEP" => WifiEncryption::Wep,
                    "WPA" | "WPA2" | "WPA3" | "SAE" => WifiEncryption::Wpa,
                    _ => WifiEncryption::Open,
                }
            }
            _ => {}
        }
    }
    Some(wifi)
}

fn parse_geo(text: &str) -> Option<GeoPoint> {
    let rest = strip_prefix_ci(text, "geo:")?;
    let coordinates = rest.split(['?', ';']).next()?;
    let mut parts = coordinates.split(',');
    let lat: f64 = parts.next()?.trim().parse().ok()?;
    let lng: f64 = parts.next()?.trim().parse().ok()?;
    ((-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lng)).then_some(GeoPoint { lat, lng })
}

// ---------------------------------------------------------------------------
// Driver licenses (AAMVA)
// ---------------------------------------------------------------------------

fn parse_aamva(text: &str) -> Option<DriverLicense> {
    if !text.starts_with('@') || !text.contains("ANSI ") {
        return None;
    }
    let element = |id: &str| {
        text.lines()
            .flat_map(|line| line.split('\u{1e}'))
            .map(str::trim)
            .find_map(|line| {
                // The first element shares its line with the subfile header.
                let start = line.find(id)?;
                let value = line[start + id.len()..].trim();
                (!value.is_empty()).then(|| value.to_owned())
            })
    };
    let license_number = element("DAQ")?;
    Some(DriverLicense {
        license_number,
        first_name: element("DAC").or_else(|| element("DCT")),
        last_name: element("DCS"),
        birth_date: element("DBB"),
        expiry_date: element("DBA"),
        issuing_country: element("DCG"),
    })
}

// ---------------------------------------------------------------------------
// Retail codes
// ---------------------------------------------------------------------------

fn is_isbn(text: &str) -> bool {
    text.len() == 13
        && (text.starts_with("978") || text.starts_with("979"))
        && has_valid_gtin_check_digit(text)
}

fn is_product_code(text: &str) -> bool {
    matches!(text.len(), 8 | 12 | 13) && has_valid_gtin_check_digit(text)
}

/// GTIN check digit over EAN-8, UPC-A, and EAN-13: weights 3,1,3,... from the
/// digit left of the check digit.
fn has_valid_gtin_check_digit(text: &str) -> bool {
    if !text.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }
    let digits: Vec<u32> = text.bytes().map(|b| u32::from(b - b'0')).collect();
    let Some((&check, payload)) = digits.split_last() else {
        return false;
    };
    let sum: u32 = payload
        .iter()
        .rev()
        .enumerate()
        .map(|(i, &d)| if i % 2 == 0 { d * 3 } else { d })
        .sum();
    (10 - sum % 10) % 10 == check
}

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

fn strip_prefix_ci<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    let head = text.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix).then(|| &text[prefix.len()..])
}

/// Split a MECARD-style body (`K:V;K:V;;`) on unescaped semicolons, honouring
/// backslash escapes, and yield upper-cased keys with unescaped values.
fn mecard_fields(body: &str) -> Vec<(String, String)> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                if let Some(escaped) = chars.next() {
                    current.push('\\');
                    current.push(escaped);
                }
            }
            ';' => fields.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    fields.push(current);

    fields
        .into_iter()
        .filter_map(|field| {
            let (key, value) = field.split_once(':')?;
            Some((key.trim().to_ascii_uppercase(), unescape(value)))
        })
        .collect()
}

fn unescape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(escaped) = chars.next() {
                out.push(escaped);
            }
        } else {
            out.push(c);
        }
    }
    out
}

fn query_pairs(query: &str) -> Vec<(String, String)> {
    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            (percent_decode(key), percent_decode(value))
        })
        .collect()
}

fn percent_decode(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'%' if i + 2 < bytes.len() => {
                let hex = std::str::from_utf8(&bytes[i + 1..i + 3]).ok();
                match hex.and_then(|h| u8::from_str_radix(h, 16).ok()) {
                    Some(byte) => {
                        out.push(byte);
                        i += 3;
                        continue;
                    }
                    None => out.push(b'%'),
                }
            }
            b'+' => out.push(b' '),
            other => out.push(other),
        }
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}
