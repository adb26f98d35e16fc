use std::path::Path;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::{DeckError, Result};
use crate::model::TestState;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestResult {
    pub test_name: String,
    pub state: TestState,
    pub duration_ms: u64,
    pub error_message: Option<String>,
}

pub fn load_trx(path: &Path) -> Result<Vec<TestResult>> {
    let content = std::fs::read_to_string(path).map_err(|e| DeckError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;
    parse_trx(&content)
}

pub fn parse_trx(content: &str) -> Result<Vec<TestResult>> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(true);

    let mut results = Vec::new();
    let mut buf = Vec::new();

    // Result whose children are still being read
    let mut current_test: Option<TestResult> = None;
    let mut in_error_info = false;
    let mut in_message = false;
    let mut in_stack_trace = false;
    let mut error_message = String::new();
    let mut stack_trace = String::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.name().as_ref() {
                b"UnitTestResult" => current_test = read_result(&e),
                b"ErrorInfo" => in_error_info = true,
                b"Message" if in_error_info => in_message = true,
                b"StackTrace" if in_error_info => in_stack_trace = true,
                _ => {}
            },
            Ok(Event::Empty(e)) if e.name().as_ref() == b"UnitTestResult" => {
                results.extend(read_result(&e));
            }
            Ok(Event::Text(e)) => {
                if in_message {
                    error_message.push_str(&e.unescape().unwrap_or_default());
                } else if in_stack_trace {
                    stack_trace.push_str(&e.unescape().unwrap_or_default());
                }
            }
            Ok(Event::End(e)) => match e.name().as_ref() {
                b"UnitTestResult" => {
                    if let Some(mut test) = current_test.take() {
                        test.error_message = combine_error(&error_message, &stack_trace);
                        results.push(test);
                    }
                    error_message.clear();
                    stack_trace.clear();
                }
                b"ErrorInfo" => in_error_info = false,
                b"Message" => in_message = false,
                b"StackTrace" => in_stack_trace = false,
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(DeckError::TrxParse(format!("XML parse error: {}", e)));
            }
            _ => {}
        }
        buf.clear();
    }

    Ok(results)
}

fn read_result(element: &BytesStart<'_>) -> Option<TestResult> {
    let mut test_name = String::new();
    let mut state = TestState::Passed;
    let mut duration_ms = 0u64;

    for attr in element.attributes().flatten() {
        match attr.key.as_ref() {
            b"testName" => {
                test_name = String::from_utf8_lossy(&attr.value).to_string();
            }
            b"outcome" => {
                state = outcome_state(&String::from_utf8_lossy(&attr.value));
            }
            b"duration" => {
                duration_ms = parse_duration(&String::from_utf8_lossy(&attr.value));
            }
            _ => {}
        }
    }

    if test_name.is_empty() {
        return None;
    }
    Some(TestResult {
        test_name,
        state,
        duration_ms,
        error_message: None,
    })
}

/// VSTest outcome attribute to test state.
fn outcome_state(outcome: &str) -> TestState {
    match outcome {
        "Passed" => TestState::Passed,
        "Failed" | "Error" | "Timeout" | "Aborted" => TestState::Failed,
        _ => TestState::Skipped,
    }
}

fn combine_error(message: &str, stack_trace: &str) -> Option<String> {
    if message.is_empty() && stack_trace.is_empty() {
        return None;
    }
    let mut full_error = message.trim().to_string();
    if !stack_trace.is_empty() {
        if !full_error.is_empty() {
            full_error.push_str("\n\n");
        }
        full_error.push_str(stack_trace.trim());
    }
    Some(full_error)
}

fn parse_duration(s: &str) -> u64 {
    // Format: HH:MM:SS.FFFFFFF
    let parts: Vec<&str> = s.split(':').collect();
    if parts.len() != 3 {
        return 0;
    }

    let hours: u64 = parts[0].parse().unwrap_or(0);
    let minutes: u64 = parts[1].parse().unwrap_or(0);
    let secs_parts: Vec<&str> = parts[2].split('.').collect();
    let seconds: u64 = secs_parts[0].parse().unwrap_or(0);
    let millis: u64 = if secs_parts.len() > 1 {
        let frac = secs_parts[1].as_bytes();
        let digit = |i: usize| -> u64 {
            frac.get(i)
                .filter(|b| b.is_ascii_digit())
                .map(|b| (b - b'0') as u64)
                .unwrap_or(0)
        };
        digit(0) * 100 + digit(1) * 10 + digit(2)
    } else {
        0
    };

    (hours * 3600 + minutes * 60 + seconds) * 1000 + millis
}
