use alc_playground::interpreter::{Node, PrintSink, Token};
use alc_playground::runtime::error::{ExecutionResult, InitError, InitResult};
use alc_playground::runtime::{
    AlcEngine, CallbackRegistry, Engine, EngineStatus, Execution, RunError, StateEvent,
};
use alc_playground::{PlaygroundConfig, Session};
use futures::future::join_all;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Engine whose setup takes a while and can be told to fail or panic.
struct Slow {
    attempts: AtomicUsize,
    failures: usize,
    panics: bool,
    inner: AlcEngine,
}

impl Slow {
    fn new(failures: usize) -> Self {
        Self {
            attempts: AtomicUsize::new(0),
            failures,
            panics: false,
            inner: AlcEngine::default(),
        }
    }

    fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

impl Engine for Slow {
    fn name(&self) -> &str {
        "slow"
    }

    async fn initialize(&self) -> InitResult<()> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(20)).await;
        if self.panics {
            panic!("setup exploded");
        }
        if attempt < self.failures {
            return Err(InitError::Engine(format!("attempt {} failed", attempt)));
        }
        Ok(())
    }

    fn execute(&self, source: &str, sink: &dyn PrintSink) -> ExecutionResult<Execution> {
        self.inner.execute(source, sink)
    }

    fn inspect(&self, source: &str) -> ExecutionResult<(Vec<Token>, Node)> {
        self.inner.inspect(source)
    }
}

#[tokio::test]
async fn runs_are_rejected_until_ready() {
    let session = Session::new(PlaygroundConfig::default());
    assert_eq!(session.status(), EngineStatus::Uninitialized);
    assert_eq!(
        session.trigger_run("(print 1)").unwrap_err(),
        RunError::NotReady(EngineStatus::Uninitialized)
    );
    assert!(matches!(
        session.register_observer(CallbackRegistry::observer(|_| Ok(()))),
        Err(RunError::NotReady(_))
    ));
    assert!(session.inspect("(print 1)").is_err());

    session.initialize().await.unwrap();
    assert_eq!(session.status(), EngineStatus::Ready);
    session.trigger_run("(print 1)").unwrap();
}

#[tokio::test]
async fn concurrent_initialize_shares_one_attempt() {
    let session = Session::with_engine(PlaygroundConfig::default(), Slow::new(0));

    let results = join_all((0..8).map(|_| session.initialize())).await;

    assert!(results.iter().all(|result| result.is_ok()));
    assert_eq!(session.engine().attempts(), 1);
    assert_eq!(session.status(), EngineStatus::Ready);

    session.initialize().await.unwrap();
    assert_eq!(session.engine().attempts(), 1);
    assert_eq!(session.registry().len(), 1);
}

#[tokio::test]
async fn concurrent_waiters_share_a_failure() {
    let session = Session::with_engine(PlaygroundConfig::default(), Slow::new(1));

    let results = join_all((0..4).map(|_| session.initialize())).await;

    assert!(results.iter().all(|result| result.is_err()));
    assert_eq!(session.engine().attempts(), 1);
    assert!(matches!(session.status(), EngineStatus::Failed(_)));
}

#[tokio::test]
async fn failed_initialization_can_be_retried() {
    let session = Session::with_engine(PlaygroundConfig::default(), Slow::new(1));

    let err = session.initialize().await.unwrap_err();
    assert_eq!(err, InitError::Engine("attempt 0 failed".to_string()));
    assert_eq!(
        session.status(),
        EngineStatus::Failed("engine setup failed: attempt 0 failed".to_string())
    );
    assert!(matches!(
        session.trigger_run("(print 1)"),
        Err(RunError::NotReady(EngineStatus::Failed(_)))
    ));
    assert_eq!(session.registry().ids(), vec![session.message_log_observer()]);

    session.initialize().await.unwrap();
    assert_eq!(session.status(), EngineStatus::Ready);
    session.trigger_run("(print \"recovered\")").unwrap();
    assert_eq!(session.snapshot().message_texts(), vec!["recovered"]);
}

#[tokio::test]
async fn panicking_initialization_is_reported() {
    let engine = Slow {
        panics: true,
        ..Slow::new(0)
    };
    let session = Session::with_engine(PlaygroundConfig::default(), engine);

    let err = session.initialize().await.unwrap_err();
    assert_eq!(err, InitError::Panicked("setup exploded".to_string()));
    assert!(matches!(session.status(), EngineStatus::Failed(_)));
}

#[tokio::test]
async fn subscribers_see_run_events() {
    let session = Session::new(PlaygroundConfig::default());
    session.initialize().await.unwrap();
    let mut events = session.subscribe();

    let report = session.trigger_run("(print \"a\") (print \"b\")").unwrap();
    let failed = session.trigger_run("(").unwrap_err();
    session.clear_messages();

    let RunError::Execution(failure) = failed else {
        panic!("expected execution failure");
    };
    let mut received = Vec::new();
    while let Ok(event) = events.try_recv() {
        received.push(event);
    }
    assert_eq!(
        received,
        vec![
            StateEvent::MessageAppended { index: 0 },
            StateEvent::MessageAppended { index: 1 },
            StateEvent::ArtifactsReplaced {
                run_id: report.run_id
            },
            StateEvent::RunFailed {
                run_id: failure.run_id
            },
            StateEvent::MessagesCleared,
        ]
    );
}

#[tokio::test]
async fn inspect_does_not_touch_state() {
    let session = Session::new(PlaygroundConfig::default());
    session.initialize().await.unwrap();
    let mut events = session.subscribe();

    let (tokens, ast) = session.inspect("(print \"quiet\")").unwrap();
    assert_eq!(tokens.len(), 4);
    assert_eq!(ast.node_count(), 4);

    let snapshot = session.snapshot();
    assert!(snapshot.messages.is_empty());
    assert!(snapshot.ast().is_none());
    assert!(events.try_recv().is_err());
}

#[tokio::test]
async fn message_log_is_attached_before_the_engine_is_ready() {
    let session = Session::with_engine(PlaygroundConfig::default(), Slow::new(0));
    let log = session.message_log_observer();
    assert_eq!(session.registry().ids(), vec![log]);

    session.initialize().await.unwrap();
    let extra = session
        .register_observer(CallbackRegistry::observer(|_| Ok(())))
        .unwrap();
    assert_eq!(session.registry().ids(), vec![log, extra]);

    session.trigger_run("(print \"first run\")").unwrap();
    assert_eq!(session.snapshot().message_texts(), vec!["first run"]);
}

#[tokio::test]
async fn shutdown_is_terminal() {
    let session = Session::new(PlaygroundConfig::default());
    session.initialize().await.unwrap();
    session
        .register_observer(CallbackRegistry::observer(|_| Ok(())))
        .unwrap();
    assert_eq!(session.registry().len(), 2);

    session.shutdown();
    assert!(session.registry().is_empty());
    assert_eq!(session.status(), EngineStatus::ShutDown);

    assert_eq!(
        session.trigger_run("(print \"unheard\")").unwrap_err(),
        RunError::NotReady(EngineStatus::ShutDown)
    );
    assert_eq!(
        session
            .register_observer(CallbackRegistry::observer(|_| Ok(())))
            .unwrap_err(),
        RunError::NotReady(EngineStatus::ShutDown)
    );
    assert!(session.inspect("(print 1)").is_err());
    assert_eq!(session.initialize().await.unwrap_err(), InitError::ShutDown);
    assert_eq!(session.status(), EngineStatus::ShutDown);
    assert!(session.snapshot().messages.is_empty());
}
