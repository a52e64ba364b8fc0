//! Tool handlers for the MCP server
//!
//! This module validates tool arguments, runs the history engine against a
//! repository driver and shapes the JSON bodies returned to callers.

use chrono::TimeZone;
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use thiserror::Error;
use timewarp_git::driver::format_timestamp;
use timewarp_git::{GitError, HistoryDriver};
use tracing::{error, info};

use crate::history::{DateRange, generate_history};
use crate::reset::{ResetOutcome, reset_history};
use crate::synth::CommitSynthesizer;
use crate::validation::{Intensity, RequestedDate, parse_date};

/// Message returned with a successful generation
pub const GENERATE_SUCCESS_MESSAGE: &str = "Time travel successful!";

/// Message returned after a successful reset
pub const RESET_SUCCESS_MESSAGE: &str =
    "History reset to initial commit. Ready for a new timeline.";

/// Message returned when reset finds no repository
pub const RESET_NO_REPOSITORY_MESSAGE: &str = "No git repository found. Nothing to reset.";

// ============================================================================
// Error Types
// ============================================================================

/// Handler errors
#[derive(Debug, Error)]
pub enum HandlerError {
    /// startDate or endDate missing or empty
    #[error("startDate and endDate are required.")]
    MissingDates,

    /// A date failed to parse
    #[error("Invalid date format. Please use valid ISO date strings.")]
    InvalidDate,

    /// Intensity present but not a number in [0, 1]
    #[error("Intensity must be a number between 0 and 1.")]
    InvalidIntensity,

    /// startDate falls after endDate
    #[error("startDate must be before or equal to endDate.")]
    InvertedRange,

    /// Arguments could not be decoded at all
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Generation failed for a reason the caller cannot fix
    #[error("Internal server error occurred while generating history.")]
    Generation(#[source] GitError),

    /// Reset failed
    #[error("Reset failed: {0}")]
    Reset(#[source] GitError),

    /// JSON serialization error
    #[error("Failed to process JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl HandlerError {
    /// The HTTP-equivalent status for this error
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            HandlerError::MissingDates
            | HandlerError::InvalidDate
            | HandlerError::InvalidIntensity
            | HandlerError::InvertedRange
            | HandlerError::InvalidInput(_) => 400,
            HandlerError::Generation(_) | HandlerError::Reset(_) | HandlerError::Json(_) => 500,
        }
    }

    /// The `{error}` body returned to callers
    #[must_use]
    pub fn body(&self) -> Value {
        json!({ "error": self.to_string() })
    }
}

// ============================================================================
// Input Types
// ============================================================================

/// Input for the generate_history tool
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateInput {
    /// First day of the range
    #[serde(default)]
    pub start_date: Option<String>,
    /// Last day of the range, inclusive
    #[serde(default)]
    pub end_date: Option<String>,
    /// Weekday firing probability, a number or numeric string
    #[serde(default)]
    pub intensity: Option<Value>,
}

/// A generation request that passed validation
#[derive(Debug, Clone, PartialEq)]
pub struct GenerateRequest {
    /// Start date as supplied
    pub start: String,
    /// End date as supplied
    pub end: String,
    /// Decoded start date
    pub start_date: RequestedDate,
    /// Decoded end date
    pub end_date: RequestedDate,
    /// Intensity to apply
    pub intensity: Intensity,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

fn parse_intensity(value: Option<&Value>) -> Result<Intensity, HandlerError> {
    let intensity = match value {
        None | Some(Value::Null) => return Ok(Intensity::DEFAULT),
        Some(Value::Number(number)) => number.as_f64().and_then(Intensity::new),
        Some(Value::String(text)) => Intensity::parse(text),
        Some(_) => None,
    };
    intensity.ok_or(HandlerError::InvalidIntensity)
}

impl GenerateInput {
    /// Check the arguments, failing fast on the first problem
    ///
    /// # Errors
    ///
    /// Returns the 400-class [`HandlerError`] describing the first invalid field.
    pub fn validate<Tz: TimeZone>(self, tz: &Tz) -> Result<GenerateRequest, HandlerError> {
        let (Some(start), Some(end)) = (non_empty(self.start_date), non_empty(self.end_date))
        else {
            return Err(HandlerError::MissingDates);
        };

        let (Some(start_date), Some(end_date)) = (parse_date(&start), parse_date(&end)) else {
            return Err(HandlerError::InvalidDate);
        };

        let intensity = parse_intensity(self.intensity.as_ref())?;

        if start_date.in_zone(tz) > end_date.in_zone(tz) {
            return Err(HandlerError::InvertedRange);
        }

        Ok(GenerateRequest {
            start,
            end,
            start_date,
            end_date,
            intensity,
        })
    }
}

// ============================================================================
// Output Types
// ============================================================================

/// Requested period, echoed back
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Period {
    pub start: String,
    pub end: String,
}

/// Generation statistics
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GenerateStats {
    pub total_commits: usize,
    pub failed_events: usize,
    pub days_visited: u64,
    pub period: Period,
    pub applied_intensity: Intensity,
}

/// Response from the generate_history tool
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct GenerateResponse {
    /// Always `true`; failures are reported as errors
    pub success: bool,
    /// Human-readable message
    pub message: String,
    /// Aggregate counts
    pub stats: GenerateStats,
    /// Realized commit timestamps in day order
    pub commits: Vec<String>,
}

/// Response from the reset_history tool
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ResetResponse {
    /// Human-readable message
    pub message: String,
    /// Root commit history was reset to, absent when there was no repository
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reset_to: Option<String>,
}

impl From<ResetOutcome> for ResetResponse {
    fn from(outcome: ResetOutcome) -> Self {
        match outcome {
            ResetOutcome::NoRepository => Self {
                message: RESET_NO_REPOSITORY_MESSAGE.to_string(),
                reset_to: None,
            },
            ResetOutcome::Reset { root } => Self {
                message: RESET_SUCCESS_MESSAGE.to_string(),
                reset_to: Some(root),
            },
        }
    }
}

// ============================================================================
// Handler Functions
// ============================================================================

/// Parse input from MCP arguments into a typed struct
pub fn parse_input<T: for<'de> Deserialize<'de>>(
    args: Option<Map<String, Value>>,
) -> Result<T, HandlerError> {
    let value = args
        .map(Value::Object)
        .unwrap_or(Value::Object(serde_json::Map::new()));
    serde_json::from_value(value).map_err(|e| HandlerError::InvalidInput(e.to_string()))
}

/// Handle the generate_history tool
///
/// Validates the arguments, bootstraps the repository if needed and
/// synthesizes commits for every day of the requested range in `tz`.
pub fn handle_generate_history<D, R, Tz>(
    driver: &mut D,
    rng: R,
    tz: &Tz,
    args: Option<Map<String, Value>>,
) -> Result<GenerateResponse, HandlerError>
where
    D: HistoryDriver + ?Sized,
    R: Rng,
    Tz: TimeZone,
{
    let input: GenerateInput = parse_input(args)?;
    let request = input.validate(tz)?;

    let range = DateRange::new(
        request.start_date.calendar_day(tz),
        request.end_date.calendar_day(tz),
    )
    .ok_or(HandlerError::InvertedRange)?;

    info!(
        start = %range.start(),
        end = %range.end(),
        intensity = request.intensity.value(),
        "Generating history"
    );

    let mut synthesizer = CommitSynthesizer::new(rng, request.intensity);
    let outcome = generate_history(driver, &mut synthesizer, tz, range).map_err(|e| {
        error!(error = %e, "History generation failed");
        HandlerError::Generation(e)
    })?;

    Ok(GenerateResponse {
        success: true,
        message: GENERATE_SUCCESS_MESSAGE.to_string(),
        stats: GenerateStats {
            total_commits: outcome.total_commits(),
            failed_events: outcome.failed_events,
            days_visited: outcome.days_visited,
            period: Period {
                start: request.start,
                end: request.end,
            },
            applied_intensity: request.intensity,
        },
        commits: outcome.commits.iter().map(format_timestamp).collect(),
    })
}

/// Handle the reset_history tool
///
/// Resets the repository to its root commit and removes the marker file.
pub fn handle_reset_history<D>(driver: &mut D) -> Result<ResetResponse, HandlerError>
where
    D: HistoryDriver + ?Sized,
{
    reset_history(driver).map(ResetResponse::from).map_err(|e| {
        error!(error = %e, "History reset failed");
        HandlerError::Reset(e)
    })
}

// ============================================================================
// Tests
// ============================================================================
