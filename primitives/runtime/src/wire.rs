//! Serde helpers for fields whose wire form differs from their client type
//!
//! Use with `#[serde(with = "runtime::wire::base64")]` and friends.

/// `Vec<u8>` as standard base64 text
pub mod base64 {
    use ::base64::engine::general_purpose::STANDARD;
    use ::base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    /// Encode bytes
    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    /// Decode bytes
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let text = String::deserialize(deserializer)?;
        STANDARD.decode(text.as_bytes()).map_err(serde::de::Error::custom)
    }
}

/// `std::time::Duration` as an ISO 8601 duration (`P1DT2H3M4.5S`)
pub mod duration {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    /// Format a duration
    pub fn format(value: &Duration) -> String {
        let total = value.as_secs();
        let (days, rem) = (total / 86_400, total % 86_400);
        let (hours, rem) = (rem / 3_600, rem % 3_600);
        let (minutes, seconds) = (rem / 60, rem % 60);
        let nanos = value.subsec_nanos();

        let mut out = String::from("P");
        if days > 0 {
            out.push_str(&format!("{}D", days));
        }
        out.push('T');
        if hours > 0 {
            out.push_str(&format!("{}H", hours));
        }
        if minutes > 0 {
            out.push_str(&format!("{}M", minutes));
        }
        if nanos > 0 {
            let fraction = format!("{:09}", nanos);
            out.push_str(&format!("{}.{}S", seconds, fraction.trim_end_matches('0')));
        } else if seconds > 0 || out == "PT" {
            out.push_str(&format!("{}S", seconds));
        }
        if out.ends_with('T') {
            out.pop();
        }
        out
    }

    /// Parse a duration; years and months are rejected as ambiguous
    pub fn parse(text: &str) -> Result<Duration, String> {
        let body = text.strip_prefix('P').ok_or_else(|| format!("`{}` does not start with P", text))?;
        let mut seconds = 0f64;
        let mut in_time = false;
        let mut number = String::new();
        for c in body.chars() {
            match c {
                'T' => in_time = true,
                '0'..='9' | '.' | ',' => number.push(if c == ',' { '.' } else { c }),
                unit => {
                    let value: f64 =
                        number.parse().map_err(|_| format!("invalid number before `{}` in `{}`", unit, text))?;
                    number.clear();
                    seconds += match (unit, in_time) {
                        ('W', false) => value * 604_800.0,
                        ('D', false) => value * 86_400.0,
                        ('H', true) => value * 3_600.0,
                        ('M', true) => value * 60.0,
                        ('S', true) => value,
                        _ => return Err(format!("unsupported designator `{}` in `{}`", unit, text)),
                    };
                }
            }
        }
        if !number.is_empty() {
            return Err(format!("trailing number in `{}`", text));
        }
        Ok(Duration::from_secs_f64(seconds))
    }

    /// Serialize a duration
    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format(value))
    }

    /// Deserialize a duration
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let text = String::deserialize(deserializer)?;
        parse(&text).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde::{Deserialize, Serialize};

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Blob {
        #[serde(with = "super::base64")]
        data: Vec<u8>,
        #[serde(with = "super::duration")]
        ttl: Duration,
    }

    #[test]
    fn test_blob_wire_form() {
        let blob = Blob { data: b"hi".to_vec(), ttl: Duration::from_secs(90_061) };
        let text = serde_json::to_string(&blob).expect("serialize");
        assert_eq!(text, r#"{"data":"aGk=","ttl":"P1DT1H1M1S"}"#);
        let back: Blob = serde_json::from_str(&text).expect("deserialize");
        assert_eq!(back, blob);
    }

    #[test]
    fn test_duration_forms() {
        assert_eq!(super::duration::format(&Duration::ZERO), "PT0S");
        assert_eq!(super::duration::format(&Duration::from_millis(1500)), "PT1.5S");
        assert_eq!(super::duration::parse("PT1.5S"), Ok(Duration::from_millis(1500)));
        assert_eq!(super::duration::parse("P2D"), Ok(Duration::from_secs(172_800)));
        assert!(super::duration::parse("P1Y").is_err());
    }
}
