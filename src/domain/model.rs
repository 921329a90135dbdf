use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};

pub const SUPPORTED_CURRENCIES: &[&str] = &["UAH", "USD", "EUR"];
pub const SUPPORTED_LANGUAGES: &[&str] = &["uk", "en"];

/// 圖片來源分類：直接 URL 原樣回傳，其餘視為儲存鍵
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSource<'a> {
    Empty,
    Direct(&'a str),
    Key(&'a str),
}

impl<'a> ImageSource<'a> {
    pub fn classify(input: &'a str) -> Self {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return ImageSource::Empty;
        }

        let lower = trimmed.to_ascii_lowercase();
        let direct = lower.starts_with("http://")
            || lower.starts_with("https://")
            || lower.starts_with("data:")
            || lower.starts_with("blob:")
            || trimmed.starts_with('/');

        if direct {
            ImageSource::Direct(input)
        } else {
            ImageSource::Key(trimmed)
        }
    }
}

/// Presigned URLs never live longer than this, whatever the backend claims.
pub const MAX_PRESIGNED_TTL_SECS: i64 = 7 * 24 * 60 * 60;

/// JSON number to whole units; floats are truncated, non-finite values rejected.
fn whole_units(number: &serde_json::Number) -> Option<i64> {
    number.as_i64().or_else(|| {
        number
            .as_f64()
            .filter(|value| value.is_finite())
            .map(|value| value.trunc() as i64)
    })
}

/// `expiresAt` arrives as epoch seconds, epoch millis, or an RFC 3339 string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExpiresAt {
    Epoch(serde_json::Number),
    Text(String),
}

impl ExpiresAt {
    const MILLIS_THRESHOLD: i64 = 100_000_000_000;

    fn from_epoch(value: i64) -> Option<DateTime<Utc>> {
        if value >= Self::MILLIS_THRESHOLD {
            Utc.timestamp_millis_opt(value).single()
        } else {
            Utc.timestamp_opt(value, 0).single()
        }
    }

    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        match self {
            ExpiresAt::Epoch(number) => whole_units(number).and_then(Self::from_epoch),
            ExpiresAt::Text(text) => DateTime::parse_from_rfc3339(text)
                .ok()
                .map(|dt| dt.with_timezone(&Utc))
                .or_else(|| {
                    text.trim()
                        .parse::<f64>()
                        .ok()
                        .filter(|value| value.is_finite())
                        .and_then(|value| Self::from_epoch(value.trunc() as i64))
                }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedUrlPayload {
    #[serde(default)]
    pub url: String,
    #[serde(default, alias = "expires_at")]
    pub expires_at: Option<ExpiresAt>,
    #[serde(default, alias = "expires_in")]
    pub expires_in: Option<serde_json::Number>,
}

impl SignedUrlPayload {
    /// 將過期時間正規化為絕對時間；都缺少時使用 `default_ttl`
    pub fn normalize(self, now: DateTime<Utc>, default_ttl: Duration) -> Option<PresignedUrl> {
        let url = self.url.trim().to_string();
        if url.is_empty() {
            return None;
        }

        // 過期時間上限為 7 天
        let ceiling = now
            .checked_add_signed(Duration::seconds(MAX_PRESIGNED_TTL_SECS))
            .unwrap_or(now);

        let expires_at = self
            .expires_at
            .as_ref()
            .and_then(ExpiresAt::to_datetime)
            .or_else(|| {
                self.expires_in
                    .as_ref()
                    .and_then(whole_units)
                    .map(|secs| secs.clamp(0, MAX_PRESIGNED_TTL_SECS))
                    .and_then(Duration::try_seconds)
                    .and_then(|ttl| now.checked_add_signed(ttl))
            })
            .or_else(|| now.checked_add_signed(default_ttl))
            .unwrap_or(ceiling)
            .min(ceiling);

        Some(PresignedUrl { url, expires_at })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresignedUrl {
    pub url: String,
    pub expires_at: DateTime<Utc>,
}

impl PresignedUrl {
    pub fn remaining(&self, now: DateTime<Utc>) -> Duration {
        self.expires_at - now
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthSession {
    pub token: String,
    #[serde(default)]
    pub user: Option<serde_json::Value>,
}

impl AuthSession {
    pub fn user_id(&self) -> Option<String> {
        let id = self.user.as_ref()?.get("id")?;
        match id {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentlyViewedItem {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub viewed_at: Option<DateTime<Utc>>,
}
