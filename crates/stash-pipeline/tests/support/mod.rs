//! Scripted in-process classifier and fixtures shared by the pipeline tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use stash_classify::{Classifier, ClassifyError, parse_classification};
use stash_core::classification::{
    ChatRequest, ChatResponse, ClassificationResult, GroupingRequest, GroupingResponse,
    KnownProject, ProjectMatch, SubtaskRequest, SubtaskResponse, Tags,
};
use stash_core::enums::{GtdList, TimeEstimate};
use stash_db::service::StashService;
use stash_db::test_support::memory_service;
use stash_pipeline::Scheduler;

/// What the fake answers to one classification.
#[derive(Clone)]
pub enum Reply {
    Result(ClassificationResult),
    /// A JSON body, decoded the way a real backend decodes it.
    Raw(&'static str),
    Fail(&'static str),
    Hang,
}

type Script = Box<dyn Fn(&str) -> Reply + Send + Sync>;

pub struct FakeClassifier {
    script: Script,
    delay: Duration,
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
    pub calls: AtomicUsize,
    pub last_known: Mutex<Vec<KnownProject>>,
    pub subtasks: Mutex<Result<Vec<String>, &'static str>>,
    pub grouping: Mutex<Option<GroupingResponse>>,
    pub last_grouping: Mutex<Option<GroupingRequest>>,
    pub chat_reply: Mutex<Result<String, &'static str>>,
    pub last_chat: Mutex<Option<ChatRequest>>,
}

impl FakeClassifier {
    pub fn new(script: impl Fn(&str) -> Reply + Send + Sync + 'static) -> Self {
        Self {
            script: Box::new(script),
            delay: Duration::ZERO,
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            calls: AtomicUsize::new(0),
            last_known: Mutex::new(Vec::new()),
            subtasks: Mutex::new(Err("no subtasks scripted")),
            grouping: Mutex::new(None),
            last_grouping: Mutex::new(None),
            chat_reply: Mutex::new(Err("no chat reply scripted")),
            last_chat: Mutex::new(None),
        }
    }

    /// Always answer `reply`.
    pub fn always(reply: Reply) -> Self {
        Self::new(move |_| reply.clone())
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Classifier for FakeClassifier {
    async fn classify(
        &self,
        text: &str,
        known_projects: &[KnownProject],
    ) -> Result<ClassificationResult, ClassifyError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        *self.last_known.lock().unwrap() = known_projects.to_vec();

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let reply = (self.script)(text);
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        match reply {
            Reply::Result(result) => Ok(result),
            Reply::Raw(body) => parse_classification(body),
            Reply::Fail(message) => Err(ClassifyError::Api {
                status: 500,
                message: message.to_string(),
            }),
            Reply::Hang => {
                std::future::pending::<()>().await;
                Err(ClassifyError::EmptyResponse)
            }
        }
    }

    async fn decompose(&self, _request: &SubtaskRequest) -> Result<SubtaskResponse, ClassifyError> {
        match self.subtasks.lock().unwrap().clone() {
            Ok(subtasks) => Ok(SubtaskResponse { subtasks }),
            Err(message) => Err(ClassifyError::Malformed(message.to_string())),
        }
    }

    async fn group(&self, request: &GroupingRequest) -> Result<GroupingResponse, ClassifyError> {
        *self.last_grouping.lock().unwrap() = Some(request.clone());
        self.grouping
            .lock()
            .unwrap()
            .clone()
            .ok_or(ClassifyError::EmptyResponse)
    }

    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, ClassifyError> {
        *self.last_chat.lock().unwrap() = Some(request.clone());
        match self.chat_reply.lock().unwrap().clone() {
            Ok(reply) => Ok(ChatResponse { reply }),
            Err(message) => Err(ClassifyError::Api {
                status: 500,
                message: message.to_string(),
            }),
        }
    }
}

pub fn classification(title: &str, project_match: ProjectMatch) -> ClassificationResult {
    ClassificationResult {
        rewritten_title: title.to_string(),
        list: Some(GtdList::Next),
        tags: Tags {
            time: TimeEstimate::FiveMin,
            energy: None,
            contexts: vec!["@errands".to_string()],
        },
        project_match,
    }
}

pub fn new_project(name: &str, confidence: u8) -> ProjectMatch {
    ProjectMatch {
        id: None,
        name: name.to_string(),
        is_new: true,
        outcome: Some(format!("{name} handled")),
        confidence,
    }
}

pub fn existing_project(id: &str, name: &str, confidence: u8) -> ProjectMatch {
    ProjectMatch {
        id: Some(id.to_string()),
        name: name.to_string(),
        is_new: false,
        outcome: None,
        confidence,
    }
}

pub async fn setup(classifier: FakeClassifier) -> (Arc<StashService>, Arc<FakeClassifier>, Scheduler) {
    let store = Arc::new(memory_service().await.unwrap());
    let classifier = Arc::new(classifier);
    let scheduler = Scheduler::new(Arc::clone(&store), classifier.clone());
    (store, classifier, scheduler)
}
