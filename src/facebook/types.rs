use chrono::{DateTime, NaiveDateTime, Utc};
use serde::de::{self, Unexpected};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Token record returned by the `oauth/access_token` endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AccessToken {
    #[serde(rename = "access_token", deserialize_with = "deserialize_lenient_string")]
    pub value: String,
    #[serde(deserialize_with = "deserialize_lenient_string")]
    pub token_type: String,
}

/// Author of a comment (`from` on the wire).
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CommentUser {
    #[serde(deserialize_with = "deserialize_lenient_string")]
    pub id: String,
    #[serde(deserialize_with = "deserialize_lenient_string")]
    pub name: String,
}

/// A single comment plus, once resolved by the client, its replies.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Comment {
    #[serde(deserialize_with = "deserialize_lenient_string")]
    pub id: String,

    #[serde(deserialize_with = "deserialize_created_time")]
    pub created_time: Option<DateTime<Utc>>,

    #[serde(rename = "from")]
    pub author: Option<CommentUser>,

    #[serde(deserialize_with = "deserialize_lenient_string")]
    pub message: String,

    /// `None` until the client has queried this comment's own id for replies.
    /// After that it is always `Some`, possibly empty.
    #[serde(skip)]
    pub children: Option<Vec<Comment>>,
}

impl Comment {
    /// Replies of this comment, treating an unresolved list as empty.
    pub fn replies(&self) -> &[Comment] {
        self.children.as_deref().unwrap_or_default()
    }
}

/// Raw shape of one comments endpoint response.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CommentsPage {
    #[serde(rename = "data", default)]
    pub comments: Option<Vec<Comment>>,
}

/// What a comments page actually holds once decoded.
#[derive(Debug, Clone, PartialEq)]
pub enum PageContents {
    /// The API had nothing for this id. Terminates the reply walk.
    NoData,
    /// At least one comment.
    Comments(Vec<Comment>),
}

impl CommentsPage {
    pub fn into_contents(self) -> PageContents {
        match self.comments {
            Some(comments) if !comments.is_empty() => PageContents::Comments(comments),
            _ => PageContents::NoData,
        }
    }
}

/// `null` reads as an empty string and numbers as their decimal text.
fn deserialize_lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(String::new()),
        Some(Value::String(s)) => Ok(s),
        Some(Value::Number(n)) => Ok(n.to_string()),
        Some(Value::Bool(b)) => Err(de::Error::invalid_type(
            Unexpected::Bool(b),
            &"string or number",
        )),
        Some(Value::Array(_)) => Err(de::Error::invalid_type(
            Unexpected::Seq,
            &"string or number",
        )),
        Some(Value::Object(_)) => Err(de::Error::invalid_type(
            Unexpected::Map,
            &"string or number",
        )),
    }
}

/// Accepts Graph API timestamps (`2017-03-20T12:13:14+0000`), RFC 3339,
/// and naive `2017-03-20 12:13:14` values which are read as UTC.
fn deserialize_created_time<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw {
        None => Ok(None),
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => parse_timestamp(s.trim())
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("unrecognized created_time: {s}"))),
    }
}

pub(crate) fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%z") {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_graph_api_timestamp() {
        let parsed = parse_timestamp("2017-03-20T12:13:14+0000").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2017, 3, 20, 12, 13, 14).unwrap());
    }

    #[test]
    fn test_offset_timestamp_normalized_to_utc() {
        let parsed = parse_timestamp("2017-03-20T12:13:14+02:00").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2017, 3, 20, 10, 13, 14).unwrap());
    }

    #[test]
    fn test_naive_timestamp_is_utc() {
        let parsed = parse_timestamp("2017-03-20 12:13:14").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2017, 3, 20, 12, 13, 14).unwrap());
    }

    #[derive(Debug, Deserialize)]
    struct Wrapper {
        #[serde(default, deserialize_with = "deserialize_lenient_string")]
        value: String,
    }

    fn parse_value(input: &str) -> Result<String, serde_json::Error> {
        serde_json::from_str::<Wrapper>(input).map(|wrapper| wrapper.value)
    }

    #[test]
    fn test_lenient_string_accepts_strings_numbers_and_null() {
        assert_eq!(parse_value(r#"{"value": "hello"}"#).unwrap(), "hello");
        assert_eq!(parse_value(r#"{"value": 1234567890}"#).unwrap(), "1234567890");
        assert_eq!(parse_value(r#"{"value": null}"#).unwrap(), "");
        assert_eq!(parse_value("{}").unwrap(), "");
        assert!(parse_value(r#"{"value": true}"#).is_err());
        assert!(parse_value(r#"{"value": [1]}"#).is_err());
        assert!(parse_value(r#"{"value": {"a": 1}}"#).is_err());
    }

    #[test]
    fn test_garbage_timestamp() {
        assert!(parse_timestamp("yesterday").is_none());
    }

    #[test]
    fn test_empty_page_is_no_data() {
        let page = CommentsPage {
            comments: Some(Vec::new()),
        };
        assert_eq!(page.into_contents(), PageContents::NoData);
        assert_eq!(CommentsPage::default().into_contents(), PageContents::NoData);
    }

    #[test]
    fn test_populated_page_keeps_order() {
        let page = CommentsPage {
            comments: Some(vec![
                Comment {
                    id: "a".into(),
                    ..Default::default()
                },
                Comment {
                    id: "b".into(),
                    ..Default::default()
                },
            ]),
        };
        match page.into_contents() {
            PageContents::Comments(comments) => {
                let ids: Vec<_> = comments.iter().map(|c| c.id.as_str()).collect();
                assert_eq!(ids, ["a", "b"]);
            }
            PageContents::NoData => panic!("expected comments"),
        }
    }

    #[test]
    fn test_unresolved_replies_read_as_empty() {
        let comment = Comment::default();
        assert!(comment.children.is_none());
        assert!(comment.replies().is_empty());
    }
}
