pub mod duration {
    use crate::time::timeunit::parse_duration;
    use serde::de::Error;
    use serde::Deserializer;
    use serde_derive::Deserialize;
    use std::time::Duration;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum DurationValue {
        Millis(u64),
        Text(String),
    }

    /// Accepts either a plain number of milliseconds or a unit string such as `"30s"`.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        match <DurationValue as serde::Deserialize>::deserialize(deserializer)? {
            DurationValue::Millis(millis) => Ok(Duration::from_millis(millis)),
            DurationValue::Text(text) => {
                parse_duration(text.as_str()).map_err(|err| D::Error::custom(err.to_string()))
            }
        }
    }
}
