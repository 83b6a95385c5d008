// Shared helpers for integration tests: a scripted transport that records
// every call and answers from a queue.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value};

use kayako_client::{
    Client, Config, FilePart, KayakoError, RequestData, Result, TicketDefaults, Transport,
    WireData,
};

/// One request seen by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub method: &'static str,
    pub controller: String,
    pub params: Vec<String>,
    pub fields: Vec<(String, String)>,
    pub files: usize,
}

/// Answers requests in order; an empty queue answers with an empty node.
#[derive(Default)]
pub struct ScriptedTransport {
    calls: Mutex<Vec<Call>>,
    responses: Mutex<VecDeque<Result<WireData>>>,
}

impl ScriptedTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Queues a decoded response body.
    pub fn respond(&self, data: WireData) -> &Self {
        self.responses.lock().unwrap().push_back(Ok(data));
        self
    }

    /// Queues a failure.
    pub fn fail(&self, error: KayakoError) -> &Self {
        self.responses.lock().unwrap().push_back(Err(error));
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    fn answer(
        &self,
        method: &'static str,
        controller: &str,
        params: &[String],
        fields: Option<&RequestData>,
        files: usize,
    ) -> Result<WireData> {
        self.calls.lock().unwrap().push(Call {
            method,
            controller: controller.to_string(),
            params: params.to_vec(),
            fields: fields.map(RequestData::to_form_pairs).unwrap_or_default(),
            files,
        });
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(json!({})))
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn get(&self, controller: &str, params: &[String]) -> Result<WireData> {
        self.answer("GET", controller, params, None, 0)
    }

    async fn post(
        &self,
        controller: &str,
        params: &[String],
        fields: &RequestData,
        files: &[FilePart],
    ) -> Result<WireData> {
        self.answer("POST", controller, params, Some(fields), files.len())
    }

    async fn put(
        &self,
        controller: &str,
        params: &[String],
        fields: &RequestData,
    ) -> Result<WireData> {
        self.answer("PUT", controller, params, Some(fields), 0)
    }

    async fn delete(&self, controller: &str, params: &[String]) -> Result<()> {
        self.answer("DELETE", controller, params, None, 0).map(|_| ())
    }
}

pub fn config() -> Config {
    Config::new("https://help.example.com/api/", "key-1", "secret-1")
        .unwrap()
        .with_datetime_format("%Y-%m-%d %H:%M")
        .with_ticket_defaults(TicketDefaults {
            status_id: Some(1),
            priority_id: Some(2),
            type_id: Some(3),
            auto_create_user: true,
        })
}

pub fn client(transport: &Arc<ScriptedTransport>) -> Client {
    Client::with_transport(config(), transport.clone())
}

/// Value of a sent form field.
pub fn field<'a>(call: &'a Call, name: &str) -> Option<&'a str> {
    call.fields
        .iter()
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.as_str())
}

pub fn department_node(id: u64, title: &str) -> Value {
    json!({
        "id": id.to_string(),
        "title": title,
        "type": "public",
        "module": "tickets",
        "displayorder": "1",
        "parentdepartmentid": "0",
        "uservisibilitycustom": "0"
    })
}

pub fn departments(nodes: Vec<Value>) -> WireData {
    json!({ "department": nodes })
}

pub fn ticket_note_node(ticket_id: u64, id: u64, contents: &str) -> Value {
    json!({
        "_attributes": {
            "type": "ticket",
            "id": id.to_string(),
            "ticketid": ticket_id.to_string(),
            "notecolor": "1",
            "creatorstaffid": "7",
            "creatorstaffname": "Jane Admin",
            "forstaffid": "0",
            "creationdate": "1300000000"
        },
        "_contents": contents
    })
}
