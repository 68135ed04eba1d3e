//! In-memory collaborators shared by the unit tests of this crate.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use voxhome_domain::command::Primitive;
use voxhome_domain::device::{ConnectionParams, DeviceDescriptor, PowerState};

use crate::ports::{
    Ack, CommandError, ConnectError, InterpretationService, InterpretationServiceError,
    ListenOutcome, ProtocolAdapter, ScanError, SpeechCapture, SpeechServiceError,
};

/// Every call the fake protocol received, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
    Scan,
    Connect(String),
    Send(String, Primitive),
}

#[derive(Debug)]
pub(crate) struct FakeConnection {
    pub(crate) device_id: String,
}

/// Protocol adapter that records calls and fails on demand.
#[derive(Default)]
pub(crate) struct FakeProtocol {
    scans: Mutex<VecDeque<Result<Vec<DeviceDescriptor>, String>>>,
    scan_delay: Mutex<Option<Duration>>,
    refuse_connect: Mutex<HashSet<String>>,
    hang_connect: Mutex<HashSet<String>>,
    failing: Mutex<HashSet<String>>,
    hang_commands: Mutex<bool>,
    power: Mutex<HashMap<String, PowerState>>,
    calls: Mutex<Vec<Call>>,
    scans_started: AtomicUsize,
}

impl FakeProtocol {
    /// Queue the result of the next scan. Scans with nothing queued find no
    /// devices.
    pub(crate) fn push_scan(&self, result: Result<Vec<DeviceDescriptor>, String>) {
        self.scans.lock().unwrap().push_back(result);
    }

    pub(crate) fn set_scan_delay(&self, delay: Duration) {
        *self.scan_delay.lock().unwrap() = Some(delay);
    }

    /// Refuse connections for this device id.
    pub(crate) fn refuse_connect(&self, device_id: &str) {
        self.refuse_connect
            .lock()
            .unwrap()
            .insert(device_id.to_string());
    }

    /// Never answer connection attempts for this device id.
    pub(crate) fn hang_connect(&self, device_id: &str) {
        self.hang_connect
            .lock()
            .unwrap()
            .insert(device_id.to_string());
    }

    /// Fail every command sent to this device id.
    pub(crate) fn fail_commands(&self, device_id: &str) {
        self.failing.lock().unwrap().insert(device_id.to_string());
    }

    /// Make every command hang forever.
    pub(crate) fn hang_commands(&self) {
        *self.hang_commands.lock().unwrap() = true;
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn sent(&self) -> Vec<(String, Primitive)> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Send(id, p) => Some((id, p)),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn connect_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::Connect(_)))
            .count()
    }

    pub(crate) fn scans_started(&self) -> usize {
        self.scans_started.load(Ordering::SeqCst)
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

impl ProtocolAdapter for FakeProtocol {
    type Connection = FakeConnection;

    async fn scan(&self) -> Result<Vec<DeviceDescriptor>, ScanError> {
        self.scans_started.fetch_add(1, Ordering::SeqCst);
        self.record(Call::Scan);
        let delay = *self.scan_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let next = self.scans.lock().unwrap().pop_front();
        match next {
            Some(Ok(found)) => Ok(found),
            Some(Err(message)) => Err(ScanError::new(message)),
            None => Ok(Vec::new()),
        }
    }

    async fn connect(&self, params: &ConnectionParams) -> Result<FakeConnection, ConnectError> {
        self.record(Call::Connect(params.device_id.clone()));
        let hang = self.hang_connect.lock().unwrap().contains(&params.device_id);
        if hang {
            std::future::pending::<()>().await;
        }
        let refused = self
            .refuse_connect
            .lock()
            .unwrap()
            .contains(&params.device_id);
        if refused {
            return Err(ConnectError::new("connection refused"));
        }
        Ok(FakeConnection {
            device_id: params.device_id.clone(),
        })
    }

    async fn send_command(
        &self,
        connection: &FakeConnection,
        primitive: Primitive,
    ) -> Result<Ack, CommandError> {
        self.record(Call::Send(connection.device_id.clone(), primitive));
        let hang = *self.hang_commands.lock().unwrap();
        if hang {
            std::future::pending::<()>().await;
        }
        let failing = self.failing.lock().unwrap().contains(&connection.device_id);
        if failing {
            return Err(CommandError::new("device did not acknowledge"));
        }
        let mut power = self.power.lock().unwrap();
        let state = power.entry(connection.device_id.clone()).or_default();
        match primitive {
            Primitive::TurnOn => *state = PowerState::On,
            Primitive::TurnOff => *state = PowerState::Off,
            Primitive::QueryState => {}
        }
        Ok(Ack::with_power(*state))
    }
}

/// Descriptor with every field filled in; the device id is `id-<name>`.
pub(crate) fn descriptor(name: &str, address: &str) -> DeviceDescriptor {
    DeviceDescriptor {
        name: name.to_string(),
        id: format!("id-{name}"),
        address: Some(address.to_string()),
        key: Some("secret".to_string()),
        version: Some("3.3".to_string()),
    }
}

/// Interpretation service answering from a script.
#[derive(Default)]
pub(crate) struct ScriptedInterpretation {
    responses: Mutex<VecDeque<Result<String, String>>>,
    prompts: Mutex<Vec<String>>,
    hang: bool,
}

impl ScriptedInterpretation {
    pub(crate) fn answering(responses: impl IntoIterator<Item = Result<String, String>>) -> Self {
        Self {
            responses: Mutex::new(responses.into_iter().collect()),
            ..Self::default()
        }
    }

    pub(crate) fn hanging() -> Self {
        Self {
            hang: true,
            ..Self::default()
        }
    }

    pub(crate) fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

impl InterpretationService for ScriptedInterpretation {
    async fn complete(&self, prompt: &str) -> Result<String, InterpretationServiceError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        if self.hang {
            std::future::pending::<()>().await;
        }
        let next = self.responses.lock().unwrap().pop_front();
        match next {
            Some(Ok(text)) => Ok(text),
            Some(Err(message)) => Err(InterpretationServiceError::new(message)),
            None => Err(InterpretationServiceError::new("script exhausted")),
        }
    }
}

/// One scripted listening result.
pub(crate) enum Heard {
    Text(&'static str),
    Nothing,
    Garbled,
    Broken,
}

/// Speech source replaying a script, then reporting no input forever.
pub(crate) struct ScriptedSpeech {
    script: Mutex<VecDeque<Heard>>,
}

impl ScriptedSpeech {
    pub(crate) fn new(script: impl IntoIterator<Item = Heard>) -> Self {
        Self {
            script: Mutex::new(script.into_iter().collect()),
        }
    }
}

impl SpeechCapture for ScriptedSpeech {
    async fn listen(&self, _timeout: Duration) -> ListenOutcome {
        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(Heard::Text(text)) => ListenOutcome::Text(text.to_string()),
            Some(Heard::Nothing) | None => ListenOutcome::NoInput,
            Some(Heard::Garbled) => ListenOutcome::Unintelligible,
            Some(Heard::Broken) => {
                ListenOutcome::ServiceError(SpeechServiceError::new("microphone unplugged"))
            }
        }
    }
}
