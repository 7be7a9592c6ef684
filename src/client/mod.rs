//! Client side of a schedule save.
//!
//! [`SaveClient`] is the single composition point: it owns the ordered
//! interceptor list and the transport, runs every hook on each outgoing body
//! and then forwards it.

pub mod interceptor;
pub mod transport;

use crate::errors::{AppError, AppResult};
use crate::schedule::payload::SavePayload;
use chrono::NaiveDate;
use serde::Deserialize;

pub use interceptor::{SAVE_PATH, SaveInterceptor, StatusPersist};
pub use transport::{HttpTransport, Transport, TransportResponse};

/// Server reply to a save.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct SaveAck {
    pub ok: bool,
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

pub struct SaveClient<T: Transport> {
    transport: T,
    interceptors: Vec<Box<dyn SaveInterceptor>>,
}

impl<T: Transport> SaveClient<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            interceptors: Vec::new(),
        }
    }

    /// Hooks run in registration order.
    pub fn with_interceptor(mut self, hook: impl SaveInterceptor + 'static) -> Self {
        self.interceptors.push(Box::new(hook));
        self
    }

    pub fn interceptor_count(&self) -> usize {
        self.interceptors.len()
    }

    pub fn send(&self, path: &str, body: String) -> AppResult<TransportResponse> {
        let body = self
            .interceptors
            .iter()
            .fold(body, |acc, hook| hook.before_send(path, acc));
        self.transport.post(path, body)
    }

    /// Post one week's CSV, raw or as a JSON string.
    pub fn save_week(&self, week_start: NaiveDate, csv: String, json_wrap: bool) -> AppResult<SaveAck> {
        let body = if json_wrap {
            SavePayload::JsonWrapped(csv).into_body()
        } else {
            csv
        };
        let path = format!("{SAVE_PATH}?mondayISO={}", week_start.format("%Y-%m-%d"));

        let resp = self.send(&path, body)?;
        if !resp.is_success() {
            return Err(AppError::SaveRejected {
                status: resp.status,
                body: resp.body,
            });
        }
        Ok(serde_json::from_str(&resp.body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::intent::{CellEntry, GridCell, GridRow, GridState};
    use std::cell::RefCell;
    use std::rc::Rc;

    const CSV: &str = "week_start,tech,day,slot,type,details,notes,status\r\n\
                       2025-09-29,jsmith,2025-09-29,1,IMG,Laptop #4,,\r\n";

    #[derive(Clone, Default)]
    struct Recorder {
        sent: Rc<RefCell<Vec<(String, String)>>>,
        status: u16,
    }

    impl Transport for Recorder {
        fn post(&self, path: &str, body: String) -> AppResult<TransportResponse> {
            self.sent.borrow_mut().push((path.to_string(), body));
            Ok(TransportResponse {
                status: self.status,
                body: r#"{"ok":true,"file":"/weekly-grind/cantina-schedule-2025-09-29.csv"}"#.into(),
            })
        }
    }

    struct Tag(&'static str);

    impl SaveInterceptor for Tag {
        fn before_send(&self, _path: &str, body: String) -> String {
            format!("{body}{}", self.0)
        }
    }

    fn grid(done: bool) -> GridState {
        GridState {
            rows: vec![GridRow {
                tech: "jsmith".into(),
                cells: vec![GridCell {
                    entries: vec![CellEntry {
                        index: "0".into(),
                        complete: done,
                        status_field: Some(String::new()),
                        ..Default::default()
                    }],
                }],
            }],
        }
    }

    fn monday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 9, 29).unwrap()
    }

    #[test]
    fn hooks_run_in_order() {
        let rec = Recorder { status: 200, ..Default::default() };
        let client = SaveClient::new(rec.clone()).with_interceptor(Tag("a")).with_interceptor(Tag("b"));
        client.send("/x", "body-".into()).unwrap();
        assert_eq!(rec.sent.borrow()[0].1, "body-ab");
        assert_eq!(client.interceptor_count(), 2);
    }

    #[test]
    fn wrapped_save_carries_statuses() {
        let rec = Recorder { status: 200, ..Default::default() };
        let client = SaveClient::new(rec.clone()).with_interceptor(StatusPersist::new(|| grid(true)));

        let ack = client.save_week(monday(), CSV.to_string(), true).unwrap();
        assert!(ack.ok);

        let sent = rec.sent.borrow();
        assert_eq!(sent[0].0, "/weekly-grind/api/save?mondayISO=2025-09-29");
        let inner: String = serde_json::from_str(&sent[0].1).unwrap();
        assert!(inner.ends_with(",done\r\n"));
    }

    #[test]
    fn rejected_save_is_an_error() {
        let rec = Recorder { status: 500, ..Default::default() };
        let client = SaveClient::new(rec).with_interceptor(StatusPersist::new(|| grid(false)));
        let err = client.save_week(monday(), CSV.to_string(), false).unwrap_err();
        assert!(matches!(err, AppError::SaveRejected { status: 500, .. }));
    }
}
