//! Decision schemas - the structured output contract of classification prompts.
//!
//! Each stage owns exactly one schema. The `intent` enum in a schema lists
//! only that stage's vocabulary, and per-intent required fields are checked
//! here rather than by the provider, since provider-side enforcement varies.

use once_cell::sync::Lazy;
use serde_json::{json, Map, Value};
use thiserror::Error;

use super::stage::{Intent, Stage};
use super::versions::PrincipleClassification;

/// JSON type of a decision field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    String,
    Boolean,
    /// String restricted to the given labels.
    Enum(&'static [&'static str]),
}

/// A field extracted alongside the intent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaField {
    pub name: &'static str,
    pub field_type: FieldType,
    /// Intents for which the field must be present (and non-blank for strings).
    pub required_for: &'static [Intent],
    pub description: &'static str,
}

/// Output schema for one stage's classifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecisionSchema {
    /// Schema name, usable as a tool name.
    pub name: &'static str,
    pub stage: Stage,
    pub fields: Vec<SchemaField>,
}

/// Errors produced when a classifier response does not satisfy its schema.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaValidationError {
    #[error("Response is not a JSON object")]
    NotAnObject,

    #[error("Response is not valid JSON: {0}")]
    Malformed(String),

    #[error("Missing required field: {field}")]
    MissingRequired { field: String },

    #[error("Invalid type for field {field}: expected {expected}")]
    InvalidType { field: String, expected: String },

    #[error("Field {field} cannot be blank")]
    EmptyField { field: String },

    #[error("Unknown intent label: {label}")]
    UnknownIntent { label: String },

    #[error("Intent {intent} is not legal in stage {stage}")]
    IllegalIntent { intent: Intent, stage: Stage },

    #[error("Validation errors: {0:?}")]
    Multiple(Vec<SchemaValidationError>),
}

impl SchemaValidationError {
    /// Fatal errors must not be retried: the model answered within the global
    /// vocabulary but outside the stage's contract.
    pub fn is_fatal(&self) -> bool {
        self.illegal_intent().is_some()
    }

    /// The stage-illegal intent behind a fatal error, searching nested errors.
    pub fn illegal_intent(&self) -> Option<(Intent, Stage)> {
        match self {
            SchemaValidationError::IllegalIntent { intent, stage } => Some((*intent, *stage)),
            SchemaValidationError::Multiple(errors) => {
                errors.iter().find_map(SchemaValidationError::illegal_intent)
            }
            _ => None,
        }
    }

    fn collect(mut errors: Vec<SchemaValidationError>) -> Self {
        if errors.len() == 1 {
            errors.remove(0)
        } else {
            SchemaValidationError::Multiple(errors)
        }
    }
}

const CLARIFYING_QUESTION: SchemaField = SchemaField {
    name: "clarifying_question",
    field_type: FieldType::String,
    required_for: &[Intent::Clarify],
    description: "Question asking the student to disambiguate their last message",
};

static STANCE_SCHEMA: Lazy<DecisionSchema> = Lazy::new(|| DecisionSchema {
    name: "stance_decision",
    stage: Stage::AskingStance,
    fields: vec![
        CLARIFYING_QUESTION,
        SchemaField {
            name: "position",
            field_type: FieldType::String,
            required_for: &[Intent::V1Established],
            description: "The student's position in one sentence",
        },
        SchemaField {
            name: "reason",
            field_type: FieldType::String,
            required_for: &[Intent::V1Established],
            description: "The main reason the student gives for the position",
        },
    ],
});

static CHALLENGE_SCHEMA: Lazy<DecisionSchema> = Lazy::new(|| DecisionSchema {
    name: "challenge_decision",
    stage: Stage::CaseChallenge,
    fields: vec![
        CLARIFYING_QUESTION,
        SchemaField {
            name: "position",
            field_type: FieldType::String,
            required_for: &[],
            description: "Revised position if the student shifted their stance",
        },
        SchemaField {
            name: "reason",
            field_type: FieldType::String,
            required_for: &[],
            description: "Reason for the revised position",
        },
        SchemaField {
            name: "request_principle",
            field_type: FieldType::Boolean,
            required_for: &[],
            description: "True if the student is ready to articulate a general principle",
        },
    ],
});

static PRINCIPLE_SCHEMA: Lazy<DecisionSchema> = Lazy::new(|| DecisionSchema {
    name: "principle_decision",
    stage: Stage::PrincipleReasoning,
    fields: vec![
        CLARIFYING_QUESTION,
        SchemaField {
            name: "statement",
            field_type: FieldType::String,
            required_for: &[Intent::Complete, Intent::NextCase],
            description: "The principle as stated by the student",
        },
        SchemaField {
            name: "classification",
            field_type: FieldType::Enum(&PrincipleClassification::LABELS),
            required_for: &[Intent::Complete, Intent::NextCase],
            description: "MODERATE, EXTREME (needs a counter-case) or UNDETERMINED",
        },
        SchemaField {
            name: "tension",
            field_type: FieldType::String,
            required_for: &[Intent::Scaffold],
            description: "The moral tension to address without a new case",
        },
    ],
});

static CLOSURE_SCHEMA: Lazy<DecisionSchema> = Lazy::new(|| DecisionSchema {
    name: "closure_decision",
    stage: Stage::Closure,
    fields: vec![
        SchemaField {
            name: "correction",
            field_type: FieldType::String,
            required_for: &[Intent::Clarify],
            description: "What the student wants changed in the summary",
        },
        SchemaField {
            name: "closing_remark",
            field_type: FieldType::String,
            required_for: &[],
            description: "Short farewell once the student accepts the summary",
        },
    ],
});

impl DecisionSchema {
    /// The classifier schema for a stage, if the stage classifies input.
    pub fn for_stage(stage: Stage) -> Option<&'static DecisionSchema> {
        match stage {
            Stage::AskingStance => Some(&STANCE_SCHEMA),
            Stage::CaseChallenge => Some(&CHALLENGE_SCHEMA),
            Stage::PrincipleReasoning => Some(&PRINCIPLE_SCHEMA),
            Stage::Closure => Some(&CLOSURE_SCHEMA),
            Stage::AwaitingStart | Stage::Ended => None,
        }
    }

    pub fn intents(&self) -> &'static [Intent] {
        self.stage.legal_intents()
    }

    /// Renders the schema as a JSON Schema document for the provider.
    pub fn to_json_schema(&self) -> Value {
        let mut properties = Map::new();
        properties.insert(
            "intent".to_string(),
            json!({
                "type": "string",
                "enum": self.intents().iter().map(|i| i.as_str()).collect::<Vec<_>>(),
                "description": "Classified intent of the student's latest message",
            }),
        );
        for field in &self.fields {
            let mut property = match field.field_type {
                FieldType::String => json!({"type": "string"}),
                FieldType::Boolean => json!({"type": "boolean"}),
                FieldType::Enum(labels) => json!({"type": "string", "enum": labels}),
            };
            let description = if field.required_for.is_empty() {
                field.description.to_string()
            } else {
                let intents: Vec<_> = field.required_for.iter().map(|i| i.as_str()).collect();
                format!("{} (required for {})", field.description, intents.join(", "))
            };
            property["description"] = Value::String(description);
            properties.insert(field.name.to_string(), property);
        }

        json!({
            "type": "object",
            "properties": properties,
            "required": ["intent"],
        })
    }

    /// Validates a classifier response and returns its intent.
    pub fn validate(&self, output: &Value) -> Result<Intent, SchemaValidationError> {
        let obj = output.as_object().ok_or(SchemaValidationError::NotAnObject)?;

        let label = match obj.get("intent") {
            None => {
                return Err(SchemaValidationError::MissingRequired {
                    field: "intent".to_string(),
                })
            }
            Some(Value::String(label)) => label,
            Some(_) => {
                return Err(SchemaValidationError::InvalidType {
                    field: "intent".to_string(),
                    expected: "string".to_string(),
                })
            }
        };
        let intent = Intent::from_label(label).ok_or_else(|| SchemaValidationError::UnknownIntent {
            label: label.clone(),
        })?;
        if !self.stage.allows(intent) {
            return Err(SchemaValidationError::IllegalIntent {
                intent,
                stage: self.stage,
            });
        }

        let mut errors = Vec::new();
        for field in &self.fields {
            let required = field.required_for.contains(&intent);
            match obj.get(field.name) {
                None | Some(Value::Null) if required => {
                    errors.push(SchemaValidationError::MissingRequired {
                        field: field.name.to_string(),
                    });
                }
                None | Some(Value::Null) => {}
                Some(value) => {
                    if let Err(e) = Self::check_field(field, value, required) {
                        errors.push(e);
                    }
                }
            }
        }

        if errors.is_empty() {
            Ok(intent)
        } else {
            Err(SchemaValidationError::collect(errors))
        }
    }

    fn check_field(
        field: &SchemaField,
        value: &Value,
        required: bool,
    ) -> Result<(), SchemaValidationError> {
        let invalid = |expected: &str| SchemaValidationError::InvalidType {
            field: field.name.to_string(),
            expected: expected.to_string(),
        };
        match field.field_type {
            FieldType::Boolean => value.as_bool().map(|_| ()).ok_or_else(|| invalid("boolean")),
            FieldType::String => {
                let s = value.as_str().ok_or_else(|| invalid("string"))?;
                if required && s.trim().is_empty() {
                    return Err(SchemaValidationError::EmptyField {
                        field: field.name.to_string(),
                    });
                }
                Ok(())
            }
            FieldType::Enum(labels) => {
                let s = value.as_str().ok_or_else(|| invalid("string"))?;
                if labels.contains(&s) {
                    Ok(())
                } else {
                    Err(invalid(&format!("one of {}", labels.join(", "))))
                }
            }
        }
    }
}
