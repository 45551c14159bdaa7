use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::ValidationError;

// ═══════════════════════════════════════════════════════════════
//  StudentRecord
// ═══════════════════════════════════════════════════════════════

/// A validated student row. `name` is the upsert key; the other four
/// columns are overwritten on every save.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentRecord {
    pub name: String,
    pub age: i32,
    pub class_name: String,
    pub roll: i32,
    pub place: String,
}

// ═══════════════════════════════════════════════════════════════
//  StudentPayload
// ═══════════════════════════════════════════════════════════════

/// Save request as it arrived on the wire: a JSON object whose fields
/// have not been checked yet. Unknown keys are kept but ignored.
#[derive(Debug, Clone, PartialEq)]
pub struct StudentPayload {
    fields: Map<String, Value>,
}

impl StudentPayload {
    /// Parse a fully buffered body. Anything other than a JSON object
    /// (arrays, scalars, invalid UTF-8, truncated input) is `Malformed`.
    pub fn from_slice(body: &[u8]) -> Result<Self, ValidationError> {
        let fields: Map<String, Value> = serde_json::from_slice(body)
            .map_err(|e| ValidationError::Malformed(e.to_string()))?;
        Ok(Self { fields })
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Check every field and coerce the numeric ones.
    ///
    /// Text fields are checked before numbers; the first failure wins.
    pub fn validate(&self) -> Result<StudentRecord, ValidationError> {
        let name = self.text("name")?;
        let class_name = self.text("className")?;
        let place = self.text("place")?;
        let age = self.integer("age")?;
        let roll = self.integer("roll")?;

        Ok(StudentRecord {
            name: name.to_owned(),
            age,
            class_name: class_name.to_owned(),
            roll,
            place: place.to_owned(),
        })
    }

    /// `null` counts as absent.
    fn present(&self, field: &'static str) -> Result<&Value, ValidationError> {
        self.fields
            .get(field)
            .filter(|v| !v.is_null())
            .ok_or(ValidationError::MissingField(field))
    }

    fn text(&self, field: &'static str) -> Result<&str, ValidationError> {
        match self.present(field)? {
            Value::String(s) if s.is_empty() => Err(ValidationError::EmptyField(field)),
            Value::String(s) => Ok(s),
            _ => Err(ValidationError::NotText(field)),
        }
    }

    fn integer(&self, field: &'static str) -> Result<i32, ValidationError> {
        let value = self.present(field)?;
        coerce_integer(value).ok_or_else(|| ValidationError::NotANumber {
            field,
            value: value.to_string(),
        })
    }
}

/// Numbers must be integral and fit in `i32`. Strings are trimmed and
/// read as decimal numbers (`"10"`, `"10.0"`, `"1e1"`) under the same rule.
/// Blank strings are not numbers.
fn coerce_integer(value: &Value) -> Option<i32> {
    match value {
        Value::Number(n) => match n.as_i64() {
            Some(i) => i32::try_from(i).ok(),
            None => integral(n.as_f64()?),
        },
        Value::String(s) => integral(s.trim().parse::<f64>().ok()?),
        _ => None,
    }
}

fn integral(f: f64) -> Option<i32> {
    if !f.is_finite() || f.fract() != 0.0 || f < f64::from(i32::MIN) || f > f64::from(i32::MAX) {
        return None;
    }
    Some(f as i32)
}
