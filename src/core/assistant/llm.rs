//! Language-model answers via an OpenAI-compatible chat completions API.

use async_openai::Client;
use async_openai::config::OpenAIConfig;
use serde_json::{Value, json};

const SYSTEM_PROMPT: &str = "You are a helpful AI assistant for smart glasses. \
Provide clear, practical responses including code when requested.

RESPONSE RULES:
- Provide code examples when specifically asked for code
- Keep code examples concise but functional (10-20 lines max)
- For explanations: Be clear and educational
- Use simple, readable formatting
- Long responses are shown a few sentences at a time

CODE FORMATTING:
- Put code in fenced blocks with a language tag
- Show practical, working examples
- Keep variable names clear and simple";

const MAX_TOKENS: u32 = 150;
const TEMPERATURE: f64 = 0.7;

/// Errors from an answer source.
#[derive(Debug, thiserror::Error)]
pub enum AnswerError {
    #[error("{0}")]
    ApiAuth(String),
    #[error("API error: {0}")]
    ApiMessage(String),
    #[error("Model returned no content")]
    EmptyResponse,
    #[error("{0}")]
    Other(Box<dyn std::error::Error + Send + Sync + 'static>),
}

/// Map async-openai or API errors into AnswerError.
pub fn map_api_error<E>(e: E) -> AnswerError
where
    E: std::fmt::Display + Into<Box<dyn std::error::Error + Send + Sync + 'static>>,
{
    let s = e.to_string();
    if s.contains("401") || s.contains("invalid_api_key") {
        return AnswerError::ApiAuth(
            "API error (401): the API key was rejected. Check OPENAI_API_KEY in .env.".to_string(),
        );
    }
    if s.contains("\"error\"")
        && let Some((_, rest)) = s.split_once("\"message\":\"")
        && let Some((msg, _)) = rest.split_once('"')
    {
        return AnswerError::ApiMessage(msg.to_string());
    }
    AnswerError::Other(e.into())
}

pub struct LanguageModel {
    client: Client<OpenAIConfig>,
    model: String,
}

impl LanguageModel {
    pub fn new(config: OpenAIConfig, model: impl Into<String>) -> Self {
        Self {
            client: Client::with_config(config),
            model: model.into(),
        }
    }

    /// Ask the model one question (no conversation history).
    pub async fn complete(&self, question: &str) -> Result<String, AnswerError> {
        log::debug!("Asking {}: {:?}", self.model, question);
        let response: Value = self
            .client
            .chat()
            .create_byot(json!({
                "model": self.model,
                "messages": [
                    {"role": "system", "content": SYSTEM_PROMPT},
                    {"role": "user", "content": question},
                ],
                "max_tokens": MAX_TOKENS,
                "temperature": TEMPERATURE,
            }))
            .await
            .map_err(map_api_error)?;
        extract_content(&response).ok_or(AnswerError::EmptyResponse)
    }
}

/// Trimmed text of the first choice, if non-empty.
fn extract_content(response: &Value) -> Option<String> {
    response["choices"][0]["message"]["content"]
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

const BUBBLE_SORT_CODE: &str = "Here is bubble sort in JavaScript.
```javascript
function bubbleSort(arr) {
  for (let i = 0; i < arr.length; i++) {
    for (let j = 0; j < arr.length - i - 1; j++) {
      if (arr[j] > arr[j + 1]) {
        [arr[j], arr[j + 1]] = [arr[j + 1], arr[j]];
      }
    }
  }
  return arr;
}
```
Each pass moves the largest remaining value to the end.";

const STACK_CODE: &str = "A stack backed by an array.
```javascript
class Stack {
  constructor() { this.items = []; }
  push(item) { this.items.push(item); }
  pop() { return this.items.pop(); }
  peek() { return this.items[this.items.length - 1]; }
  isEmpty() { return this.items.length === 0; }
}
```";

const QUEUE_CODE: &str = "A queue backed by an array.
```javascript
class Queue {
  constructor() { this.items = []; }
  enqueue(item) { this.items.push(item); }
  dequeue() { return this.items.shift(); }
  front() { return this.items[0]; }
  isEmpty() { return this.items.length === 0; }
}
```";

const BINARY_SEARCH_CODE: &str = "Binary search over a sorted array.
```javascript
function binarySearch(arr, target) {
  let left = 0;
  let right = arr.length - 1;
  while (left <= right) {
    const mid = Math.floor((left + right) / 2);
    if (arr[mid] === target) return mid;
    if (arr[mid] < target) left = mid + 1;
    else right = mid - 1;
  }
  return -1;
}
```
It runs in logarithmic time.";

/// Canned answers used when no API key is configured.
pub fn demo_answer(question: &str) -> String {
    let q = question.to_lowercase();
    let wants_code = ["code", "show me", "implement", "example"]
        .iter()
        .any(|w| q.contains(w));

    let answer = if q.contains("bubble sort") {
        if wants_code {
            BUBBLE_SORT_CODE
        } else {
            "Bubble sort compares adjacent elements and swaps them if they're in the wrong order. It repeats until the array is sorted."
        }
    } else if q.contains("stack") {
        if wants_code {
            STACK_CODE
        } else {
            "A stack follows LIFO (Last In, First Out). Think of a stack of plates: you add and remove from the top."
        }
    } else if q.contains("queue") {
        if wants_code {
            QUEUE_CODE
        } else {
            "A queue follows FIFO (First In, First Out). Like a line at a store, the first person in line is served first."
        }
    } else if q.contains("binary search") {
        if wants_code {
            BINARY_SEARCH_CODE
        } else {
            "Binary search halves a sorted array repeatedly to find a target value. It's much faster than checking every element."
        }
    } else if q.contains("linked list") {
        "A linked list stores data in nodes, where each node points to the next one. It grows without reallocating."
    } else if q.contains("python") {
        "Python is great for beginners because of its simple syntax and readable code. It's widely used in AI and data science."
    } else if q.contains("javascript") {
        "JavaScript runs in browsers and on servers (Node.js). It's essential for web development."
    } else {
        "I'm in demo mode for general questions. Set OPENAI_API_KEY to get real answers."
    };
    answer.to_string()
}
