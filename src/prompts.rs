//! Requests for the three AI-backed game operations
//!
//! Each builder pairs a short prompt with the JSON schema the model is asked
//! to answer in. The schemas follow the generative-AI API's OpenAPI subset
//! (upper-case type names).

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::genai::GenerateRequest;

/// Estimated booking fee and popularity tier for one actor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActorFee {
    /// Estimated per-project booking fee in US dollars
    pub fee: f64,
    /// Free-text tier supplied by the model, e.g. "A-List" or "Up-and-Comer"
    pub popularity: String,
}

/// One cast member of the adaptation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CastMember {
    /// Character from the book
    pub role: String,
    /// Actor cast in the role
    pub actor_name: String,
}

const ACTOR_FEE_SYSTEM: &str = "You are a Hollywood casting director with up-to-date knowledge of \
     actor booking fees. Estimate realistic figures and respond only with JSON.";

const BOOK_ANALYSIS_SYSTEM: &str = "You are a film producer evaluating books for adaptation. \
     Respond only with JSON.";

const MOVIE_RESULTS_SYSTEM: &str = "You are a panel of film critics and a box-office analyst. \
     Judge the adaptation on its casting and respond only with JSON.";

/// Schema for an actor fee estimate
pub fn actor_fee_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "fee": { "type": "NUMBER" },
            "popularity": { "type": "STRING" }
        },
        "required": ["fee", "popularity"]
    })
}

/// Request asking for an actor's booking fee and popularity tier
pub fn actor_fee_request(model: &str, actor_name: &str) -> GenerateRequest {
    GenerateRequest {
        model: model.to_string(),
        prompt: format!(
            "Estimate the typical per-project booking fee in US dollars for the actor \"{}\", \
             and classify their popularity tier (for example \"A-List\", \"Working Actor\" or \
             \"Up-and-Comer\").",
            actor_name.trim()
        ),
        system_instruction: ACTOR_FEE_SYSTEM.to_string(),
        response_schema: actor_fee_schema(),
    }
}

/// Schema for a book analysis
pub fn book_analysis_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "summary": { "type": "STRING" },
            "genre": { "type": "STRING" },
            "characters": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "name": { "type": "STRING" },
                        "description": { "type": "STRING" }
                    },
                    "required": ["name", "description"]
                }
            }
        },
        "required": ["summary", "genre", "characters"]
    })
}

/// Request asking for a summary, genre and main characters of a book
pub fn book_analysis_request(
    model: &str,
    book_title: &str,
    author: Option<&str>,
) -> GenerateRequest {
    let book = match author.map(str::trim).filter(|a| !a.is_empty()) {
        Some(author) => format!("\"{}\" by {}", book_title.trim(), author),
        None => format!("\"{}\"", book_title.trim()),
    };

    GenerateRequest {
        model: model.to_string(),
        prompt: format!(
            "Analyze the book {} for a film adaptation. Give a short summary, its genre, and the \
             main characters that need to be cast with a one-line description of each.",
            book
        ),
        system_instruction: BOOK_ANALYSIS_SYSTEM.to_string(),
        response_schema: book_analysis_schema(),
    }
}

/// Schema for simulated critical and box-office reception
pub fn movie_results_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "criticScore": { "type": "NUMBER" },
            "audienceScore": { "type": "NUMBER" },
            "boxOffice": { "type": "NUMBER" },
            "reviews": {
                "type": "ARRAY",
                "items": { "type": "STRING" }
            }
        },
        "required": ["criticScore", "audienceScore", "boxOffice", "reviews"]
    })
}

/// Request asking how the cast adaptation is received
pub fn movie_results_request(
    model: &str,
    book_title: &str,
    cast: &[CastMember],
    budget: Option<f64>,
) -> GenerateRequest {
    let cast_list = cast
        .iter()
        .map(|member| format!("- {} as {}", member.actor_name, member.role))
        .collect::<Vec<_>>()
        .join("\n");

    let mut prompt = format!(
        "A film adaptation of \"{}\" has been cast as follows:\n{}\n",
        book_title.trim(),
        cast_list
    );
    if let Some(budget) = budget {
        prompt.push_str(&format!("The production budget is ${:.0}.\n", budget));
    }
    prompt.push_str(
        "Simulate its reception: critic and audience scores out of 100, worldwide box office in \
         US dollars, and three short reviews.",
    );

    GenerateRequest {
        model: model.to_string(),
        prompt,
        system_instruction: MOVIE_RESULTS_SYSTEM.to_string(),
        response_schema: movie_results_schema(),
    }
}
