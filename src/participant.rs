//! Participant intake.
//!
//! Collects ID, age and gender before a session. Values given on the command
//! line are used as-is; anything missing is asked for on the console. An empty
//! answer or end of input cancels the intake.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::{BufRead, Write};
use std::str::FromStr;

/// Self-reported gender, restricted to the choices offered at intake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Female,
    Male,
    Other,
}

impl Gender {
    pub const ALL: [Gender; 3] = [Gender::Female, Gender::Male, Gender::Other];

    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Female => "female",
            Gender::Male => "male",
            Gender::Other => "other",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Gender {
    type Err = IntakeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_lowercase();
        Gender::ALL
            .into_iter()
            .find(|g| g.as_str() == s || (s.len() == 1 && g.as_str().starts_with(&s)))
            .ok_or_else(|| IntakeError::InvalidGender(s))
    }
}

/// The participant a session is run for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub id: String,
    pub age: u32,
    pub gender: Gender,
}

impl Participant {
    pub fn new(id: impl Into<String>, age: u32, gender: Gender) -> Result<Self, IntakeError> {
        let id = id.into();
        validate_id(&id)?;
        Ok(Self { id, age, gender })
    }
}

/// IDs end up in file names, so only letters, digits, `-` and `_` are allowed.
pub fn validate_id(id: &str) -> Result<(), IntakeError> {
    if id.is_empty() {
        return Err(IntakeError::InvalidId("ID must not be empty".into()));
    }
    if let Some(bad) = id
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || *c == '-' || *c == '_'))
    {
        return Err(IntakeError::InvalidId(format!(
            "'{id}' contains '{bad}'; use letters, digits, '-' or '_'"
        )));
    }
    Ok(())
}

pub fn parse_age(s: &str) -> Result<u32, IntakeError> {
    let s = s.trim();
    match s.parse::<u32>() {
        Ok(age) if (1..=120).contains(&age) => Ok(age),
        _ => Err(IntakeError::InvalidAge(s.to_string())),
    }
}

/// Intake values already known before prompting.
#[derive(Debug, Clone, Default)]
pub struct IntakeDefaults {
    pub id: Option<String>,
    pub age: Option<u32>,
    pub gender: Option<Gender>,
}

/// Complete the participant record, prompting on `output` and reading from `input`
/// for each missing field. Invalid answers are reported and asked again.
pub fn collect<R: BufRead, W: Write>(
    defaults: IntakeDefaults,
    input: &mut R,
    output: &mut W,
) -> Result<Participant, IntakeError> {
    let id = match defaults.id {
        Some(id) => {
            validate_id(&id)?;
            id
        }
        None => ask(input, output, "Participant ID", |s| {
            validate_id(s)?;
            Ok(s.to_string())
        })?,
    };

    let age = match defaults.age {
        Some(age) => age,
        None => ask(input, output, "Age", parse_age)?,
    };

    let gender = match defaults.gender {
        Some(gender) => gender,
        None => ask(input, output, "Gender [female/male/other]", |s| s.parse())?,
    };

    Ok(Participant { id, age, gender })
}

fn ask<R, W, T, F>(input: &mut R, output: &mut W, label: &str, parse: F) -> Result<T, IntakeError>
where
    R: BufRead,
    W: Write,
    F: Fn(&str) -> Result<T, IntakeError>,
{
    loop {
        write!(output, "{label}: ")?;
        output.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            return Err(IntakeError::Cancelled);
        }
        let answer = line.trim();
        if answer.is_empty() {
            return Err(IntakeError::Cancelled);
        }

        match parse(answer) {
            Ok(value) => return Ok(value),
            Err(e) => writeln!(output, "  {e}")?,
        }
    }
}

/// Intake errors.
#[derive(Debug)]
pub enum IntakeError {
    Cancelled,
    InvalidId(String),
    InvalidAge(String),
    InvalidGender(String),
    IoError(String),
}

impl fmt::Display for IntakeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntakeError::Cancelled => write!(f, "Intake cancelled"),
            IntakeError::InvalidId(e) => write!(f, "Invalid ID: {e}"),
            IntakeError::InvalidAge(e) => write!(f, "Invalid age '{e}': expected 1-120"),
            IntakeError::InvalidGender(e) => {
                write!(f, "Invalid gender '{e}': expected female, male or other")
            }
            IntakeError::IoError(e) => write!(f, "IO error: {e}"),
        }
    }
}

impl std::error::Error for IntakeError {}

impl From<std::io::Error> for IntakeError {
    fn from(e: std::io::Error) -> Self {
        IntakeError::IoError(e.to_string())
    }
}
