use dropsource_core::db::open_db_in_memory;
use dropsource_core::{
    CaptureBackend, CaptureError, CaptureSession, CaptureState, Clip, DeviceHandle, Note, Project,
    ProjectId, ProjectPatch, ProjectStateManager, RecordStore, SessionHandle, SqliteRecordStore,
    StartOutcome, StopOutcome, StoreError, StoreResult,
};
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;
use uuid::Uuid;

#[derive(Default)]
struct BackendLog {
    access_requests: u32,
    released_devices: Vec<u64>,
}

/// Scriptable capture surface double.
struct MockBackend {
    log: Rc<RefCell<BackendLog>>,
    deny_permission: bool,
    fail_begin: bool,
    payload: Vec<u8>,
    probed_duration_ms: Option<i64>,
    next_handle: u64,
}

impl MockBackend {
    fn new(log: Rc<RefCell<BackendLog>>) -> Self {
        Self {
            log,
            deny_permission: false,
            fail_begin: false,
            payload: b"opus-bytes".to_vec(),
            probed_duration_ms: None,
            next_handle: 0,
        }
    }
}

impl CaptureBackend for MockBackend {
    fn request_access(&mut self) -> Result<DeviceHandle, CaptureError> {
        self.log.borrow_mut().access_requests += 1;
        if self.deny_permission {
            return Err(CaptureError::PermissionDenied("user declined".to_string()));
        }
        self.next_handle += 1;
        Ok(DeviceHandle(self.next_handle))
    }

    fn begin_capture(&mut self, _device: DeviceHandle) -> Result<SessionHandle, CaptureError> {
        if self.fail_begin {
            return Err(CaptureError::Backend("input stream refused".to_string()));
        }
        self.next_handle += 1;
        Ok(SessionHandle(self.next_handle))
    }

    fn end_capture(&mut self, _session: SessionHandle) -> Result<Vec<u8>, CaptureError> {
        Ok(self.payload.clone())
    }

    fn release_device(&mut self, device: DeviceHandle) {
        self.log.borrow_mut().released_devices.push(device.0);
    }

    fn probe_duration_ms(&self, _payload: &[u8]) -> Option<i64> {
        self.probed_duration_ms
    }
}

/// Store double whose clip writes always fail.
struct OfflineStore;

impl RecordStore for OfflineStore {
    fn create_project(&self, _title: &str) -> StoreResult<Project> {
        Err(offline())
    }
    fn update_project(&self, _id: ProjectId, _patch: &ProjectPatch) -> StoreResult<Project> {
        Err(offline())
    }
    fn upsert_note(&self, _project_id: ProjectId, _content: &str) -> StoreResult<Note> {
        Err(offline())
    }
    fn append_clip(
        &self,
        _project_id: ProjectId,
        _audio_data: &[u8],
        _duration_ms: i64,
    ) -> StoreResult<Clip> {
        Err(offline())
    }
    fn list_projects_by_recency(&self) -> StoreResult<Vec<Project>> {
        Ok(Vec::new())
    }
    fn get_note(&self, _project_id: ProjectId) -> StoreResult<Option<Note>> {
        Ok(None)
    }
    fn list_clips(&self, _project_id: ProjectId) -> StoreResult<Vec<Clip>> {
        Ok(Vec::new())
    }
}

fn offline() -> StoreError {
    StoreError::InvalidData("store offline in this test double".to_string())
}

#[test]
fn completed_take_appends_exactly_one_clip() {
    let conn = open_db_in_memory().unwrap();
    let mut state = ProjectStateManager::new(SqliteRecordStore::try_new(&conn).unwrap());
    let project_id = state.add_project("Session").unwrap();

    let log = Rc::new(RefCell::new(BackendLog::default()));
    let mut session = CaptureSession::new(MockBackend::new(Rc::clone(&log)));

    assert_eq!(session.start(project_id).unwrap(), StartOutcome::Started);
    assert_eq!(session.state(), CaptureState::Recording);

    match session.stop(&mut state).unwrap() {
        StopOutcome::Saved(clip) => {
            assert_eq!(clip.project_id, project_id);
            assert_eq!(clip.audio_data, b"opus-bytes");
        }
        other => panic!("unexpected outcome: {other:?}"),
    }

    assert_eq!(session.state(), CaptureState::Idle);
    assert_eq!(state.get_clips_for(project_id).unwrap().len(), 1);
    assert_eq!(log.borrow().released_devices.len(), 1);
}

#[test]
fn probed_duration_is_preferred_over_elapsed_time() {
    let conn = open_db_in_memory().unwrap();
    let mut state = ProjectStateManager::new(SqliteRecordStore::try_new(&conn).unwrap());
    let project_id = state.add_project("Probed").unwrap();

    let log = Rc::new(RefCell::new(BackendLog::default()));
    let mut backend = MockBackend::new(Rc::clone(&log));
    backend.probed_duration_ms = Some(4_321);
    let mut session = CaptureSession::new(backend);

    session.start(project_id).unwrap();
    let outcome = session.stop(&mut state).unwrap();
    match outcome {
        StopOutcome::Saved(clip) => assert_eq!(clip.duration_ms, 4_321),
        other => panic!("unexpected outcome: {other:?}"),
    }
}

#[test]
fn elapsed_time_fallback_lands_in_a_tolerance_band() {
    let conn = open_db_in_memory().unwrap();
    let mut state = ProjectStateManager::new(SqliteRecordStore::try_new(&conn).unwrap());
    let project_id = state.add_project("Timed").unwrap();

    let log = Rc::new(RefCell::new(BackendLog::default()));
    let mut session = CaptureSession::new(MockBackend::new(Rc::clone(&log)));

    session.start(project_id).unwrap();
    std::thread::sleep(Duration::from_millis(150));
    let outcome = session.stop(&mut state).unwrap();

    match outcome {
        StopOutcome::Saved(clip) => {
            // Tolerance band, never an exact assertion: the estimate is
            // wall-clock elapsed time, not decoded audio length.
            assert!(clip.duration_ms >= 100, "duration {}ms", clip.duration_ms);
            assert!(clip.duration_ms < 5_000, "duration {}ms", clip.duration_ms);
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
}

#[test]
fn second_start_is_rejected_while_recording() {
    let conn = open_db_in_memory().unwrap();
    let mut state = ProjectStateManager::new(SqliteRecordStore::try_new(&conn).unwrap());
    let project_id = state.add_project("Busy").unwrap();

    let log = Rc::new(RefCell::new(BackendLog::default()));
    let mut session = CaptureSession::new(MockBackend::new(Rc::clone(&log)));

    session.start(project_id).unwrap();
    assert_eq!(
        session.start(project_id).unwrap(),
        StartOutcome::AlreadyActive
    );
    // The rejected start never re-requested the device.
    assert_eq!(log.borrow().access_requests, 1);

    session.stop(&mut state).unwrap();
}

#[test]
fn stop_while_idle_is_a_no_op() {
    let conn = open_db_in_memory().unwrap();
    let mut state = ProjectStateManager::new(SqliteRecordStore::try_new(&conn).unwrap());
    state.add_project("Idle").unwrap();

    let log = Rc::new(RefCell::new(BackendLog::default()));
    let mut session = CaptureSession::new(MockBackend::new(Rc::clone(&log)));

    assert_eq!(session.stop(&mut state).unwrap(), StopOutcome::NoSession);
    assert!(log.borrow().released_devices.is_empty());
}

#[test]
fn permission_denial_is_non_fatal_and_session_stays_reusable() {
    let conn = open_db_in_memory().unwrap();
    let mut state = ProjectStateManager::new(SqliteRecordStore::try_new(&conn).unwrap());
    let project_id = state.add_project("Denied").unwrap();

    let log = Rc::new(RefCell::new(BackendLog::default()));
    let mut backend = MockBackend::new(Rc::clone(&log));
    backend.deny_permission = true;
    let mut session = CaptureSession::new(backend);

    let err = session.start(project_id).unwrap_err();
    assert!(matches!(err, CaptureError::PermissionDenied(_)));
    assert_eq!(session.state(), CaptureState::Idle);
    // Nothing was acquired, so nothing to release.
    assert!(log.borrow().released_devices.is_empty());
    assert!(state.get_clips_for(project_id).unwrap().is_empty());
}

#[test]
fn begin_failure_after_access_releases_the_device() {
    let conn = open_db_in_memory().unwrap();
    let mut state = ProjectStateManager::new(SqliteRecordStore::try_new(&conn).unwrap());
    let project_id = state.add_project("Half-acquired").unwrap();

    let log = Rc::new(RefCell::new(BackendLog::default()));
    let mut backend = MockBackend::new(Rc::clone(&log));
    backend.fail_begin = true;
    let mut session = CaptureSession::new(backend);

    let err = session.start(project_id).unwrap_err();
    assert!(matches!(err, CaptureError::Backend(_)));
    assert_eq!(session.state(), CaptureState::Idle);
    assert_eq!(log.borrow().released_devices.len(), 1);
    assert!(state.get_clips_for(project_id).unwrap().is_empty());
}

#[test]
fn persistence_failure_still_releases_device_and_returns_idle() {
    let mut state = ProjectStateManager::new(OfflineStore);
    let project_id: ProjectId = Uuid::new_v4();

    let log = Rc::new(RefCell::new(BackendLog::default()));
    let mut session = CaptureSession::new(MockBackend::new(Rc::clone(&log)));

    session.start(project_id).unwrap();
    let err = session.stop(&mut state).unwrap_err();

    assert!(matches!(err, CaptureError::SaveFailed(_)));
    assert_eq!(session.state(), CaptureState::Idle);
    assert_eq!(log.borrow().released_devices.len(), 1);
}
