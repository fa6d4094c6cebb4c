use serde::{Deserialize, Deserializer, Serialize};

/// A third-party learning resource returned by the search service.
///
/// Immutable once fetched. Missing or `null` text fields deserialize as empty
/// strings so the quality filter can reject them instead of failing the whole
/// response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    #[serde(default, deserialize_with = "null_as_empty")]
    title: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    description: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    url: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    resource_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    quality_score: Option<f64>,
}

impl Resource {
    #[must_use]
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        url: impl Into<String>,
        resource_type: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            url: url.into(),
            resource_type: resource_type.into(),
            quality_score: None,
        }
    }

    #[must_use]
    pub fn with_quality_score(mut self, score: f64) -> Self {
        self.quality_score = Some(score);
        self
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    #[must_use]
    pub fn resource_type(&self) -> &str {
        &self.resource_type
    }

    #[must_use]
    pub fn quality_score(&self) -> Option<f64> {
        self.quality_score
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Option::unwrap_or_default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_default_to_empty() {
        let resource: Resource =
            serde_json::from_str(r#"{"title":"Intro to loops","url":"https://x.dev"}"#).unwrap();
        assert_eq!(resource.description(), "");
        assert_eq!(resource.resource_type(), "");
        assert_eq!(resource.quality_score(), None);
    }

    #[test]
    fn null_fields_do_not_fail_the_list() {
        let resources: Vec<Resource> = serde_json::from_str(
            r#"[
                {"title":"Loops in depth","description":null,"url":"https://docs.python.org/3/","resource_type":null},
                {"title":"Recursion explained","description":"Worked examples","url":"https://blog.dev/r"}
            ]"#,
        )
        .unwrap();
        assert_eq!(resources.len(), 2);
        assert_eq!(resources[0].description(), "");
        assert_eq!(resources[0].resource_type(), "");
        assert_eq!(resources[1].title(), "Recursion explained");
    }
}
