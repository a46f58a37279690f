use crate::draft::Draft;
use crate::error::SubmitError;
use crate::payload::ServerErrorPayload;
use serde_json::Value;
use std::future::{self, Future};

/// The network collaborator that persists a draft.
///
/// Returns the server's response data on acceptance. The controller only
/// inspects that data for the identifier field; everything else is opaque.
/// Timeouts and retries, if any, are the implementation's concern.
pub trait Submitter {
    fn submit(
        &self,
        draft: &Draft,
        strict: bool,
    ) -> impl Future<Output = Result<Value, SubmitError>> + Send;
}

/// Adapts a synchronous closure into a [`Submitter`].
pub struct FnSubmitter<F>(pub F);

impl<F> FnSubmitter<F>
where
    F: Fn(&Draft, bool) -> Result<Value, SubmitError>,
{
    pub fn new(submit: F) -> Self {
        Self(submit)
    }
}

impl<F> Submitter for FnSubmitter<F>
where
    F: Fn(&Draft, bool) -> Result<Value, SubmitError>,
{
    fn submit(
        &self,
        draft: &Draft,
        strict: bool,
    ) -> impl Future<Output = Result<Value, SubmitError>> + Send {
        future::ready((self.0)(draft, strict))
    }
}

/// Splits a `{ "data": ... }` / `{ "error": ... }` response envelope.
///
/// A non-null `error` wins. A body with neither key is treated as the data itself.
pub fn parse_response(response: Value) -> Result<Value, SubmitError> {
    match response {
        Value::Object(mut body) => {
            match body.remove("error").or_else(|| body.remove("errors")) {
                Some(error) if !error.is_null() => {
                    Err(SubmitError::Rejected(ServerErrorPayload::from_json(error)))
                }
                _ => match body.remove("data") {
                    Some(data) => Ok(data),
                    None => Ok(Value::Object(body)),
                },
            }
        }
        other => Ok(other),
    }
}
