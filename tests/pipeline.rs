mod common;

use common::{config, shared, Outbox, ScriptedSearch, StaticWeb};
use email_courier_core::{
    run_pipeline, AppError, Courier, FileLedger, RecipientLedger, RunContext, RunListener,
};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

fn web() -> StaticWeb {
    StaticWeb::default()
        .page(
            "https://jobs.alpha.io/devops",
            "<p>Apply: hr@alpha.io or talent@alpha.io</p><img src=\"team@2x.png\">",
        )
        .page("https://alpha.io/contact", "hr@alpha.io, office@alpha.io")
        .page("https://beta.dev/careers", "Send CVs to careers@beta.dev")
}

fn search() -> ScriptedSearch {
    ScriptedSearch::default()
        .with(
            "devops alpha",
            &[
                "https://jobs.alpha.io/devops",
                "https://offline.example/",
                "https://alpha.io/contact",
            ],
        )
        .with("devops beta", &["https://beta.dev/careers"])
}

#[tokio::test]
async fn test_full_run_sends_each_address_once() {
    let dir = tempfile::tempdir().unwrap();
    let ledger_path = dir.path().join("sent_emails.txt");
    let outbox = shared(Outbox::default());
    let courier = Courier::new(shared(search()), shared(web()), outbox.clone());
    let cfg = config(&["devops alpha", "devops beta"], ledger_path.clone());
    let mut ctx = RunContext::new(cfg.log_capacity);

    let summary = run_pipeline(&cfg, &courier, &mut ctx).await.unwrap();

    assert_eq!(
        outbox.attempts(),
        vec!["hr@alpha.io", "talent@alpha.io", "office@alpha.io", "careers@beta.dev"]
    );
    assert_eq!(summary.sent, 4);
    assert_eq!(summary.links_failed, 1);
    assert_eq!(summary.queries_failed, 0);
    assert_eq!(
        std::fs::read_to_string(&ledger_path).unwrap(),
        "hr@alpha.io\ntalent@alpha.io\noffice@alpha.io\ncareers@beta.dev\n"
    );
    assert!(ctx
        .entries()
        .any(|e| e.message == "🔎 Found 3 valid emails for query: devops alpha"));
    assert_eq!(
        ctx.entries().last().unwrap().message,
        "✅ Email sending process completed!"
    );
}

#[tokio::test]
async fn test_second_run_sends_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let ledger_path = dir.path().join("sent_emails.txt");
    let cfg = config(&["devops alpha", "devops beta"], ledger_path.clone());

    let first = shared(Outbox::default());
    let courier = Courier::new(shared(search()), shared(web()), first.clone());
    run_pipeline(&cfg, &courier, &mut RunContext::new(100))
        .await
        .unwrap();
    assert_eq!(first.attempts().len(), 4);

    let second = shared(Outbox::default());
    let courier = Courier::new(shared(search()), shared(web()), second.clone());
    let summary = run_pipeline(&cfg, &courier, &mut RunContext::new(100))
        .await
        .unwrap();

    assert!(second.attempts().is_empty());
    assert_eq!(summary.sent, 0);
    assert_eq!(summary.skipped_duplicate, 4);
}

#[tokio::test]
async fn test_sent_address_is_durable_before_next_send() {
    let dir = tempfile::tempdir().unwrap();
    let ledger_path = dir.path().join("sent_emails.txt");
    let outbox = shared(Outbox {
        ledger_path: Some(ledger_path.clone()),
        ..Outbox::default()
    });
    let courier = Courier::new(shared(search()), shared(web()), outbox.clone());
    let cfg = config(&["devops alpha", "devops beta"], ledger_path);

    run_pipeline(&cfg, &courier, &mut RunContext::new(100))
        .await
        .unwrap();

    let attempts = outbox.attempts();
    let snapshots = outbox.ledger_snapshots.lock().unwrap().clone();
    for (i, snapshot) in snapshots.iter().enumerate() {
        let expected: HashSet<String> = attempts[..i].iter().cloned().collect();
        assert_eq!(snapshot, &expected, "ledger before send #{}", i + 1);
    }
}

#[tokio::test]
async fn test_refused_address_is_retried_next_run() {
    let dir = tempfile::tempdir().unwrap();
    let ledger_path = dir.path().join("sent_emails.txt");
    let cfg = config(&["devops beta"], ledger_path.clone());

    let refusing = shared(Outbox {
        refuse: HashSet::from(["careers@beta.dev".to_string()]),
        ..Outbox::default()
    });
    let courier = Courier::new(shared(search()), shared(web()), refusing.clone());
    let summary = run_pipeline(&cfg, &courier, &mut RunContext::new(100))
        .await
        .unwrap();
    assert_eq!(summary.send_failed, 1);
    assert!(!FileLedger::open(&ledger_path)
        .unwrap()
        .contains("careers@beta.dev"));

    let accepting = shared(Outbox::default());
    let courier = Courier::new(shared(search()), shared(web()), accepting.clone());
    let summary = run_pipeline(&cfg, &courier, &mut RunContext::new(100))
        .await
        .unwrap();
    assert_eq!(accepting.attempts(), vec!["careers@beta.dev"]);
    assert_eq!(summary.sent, 1);
}

#[tokio::test]
async fn test_existing_ledger_entries_are_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let ledger_path = dir.path().join("sent_emails.txt");
    std::fs::write(&ledger_path, "talent@alpha.io\n\nhr@alpha.io\n").unwrap();

    let outbox = shared(Outbox::default());
    let courier = Courier::new(shared(search()), shared(web()), outbox.clone());
    let cfg = config(&["devops alpha"], ledger_path);
    let mut ctx = RunContext::new(100);

    let summary = run_pipeline(&cfg, &courier, &mut ctx).await.unwrap();

    assert_eq!(outbox.attempts(), vec!["office@alpha.io"]);
    assert_eq!(summary.skipped_duplicate, 2);
    assert!(ctx
        .entries()
        .any(|e| e.message == "⚠️ Skipping hr@alpha.io, already sent."));
}

#[derive(Clone, Default)]
struct ProgressLog(Arc<Mutex<Vec<f64>>>);

impl RunListener for ProgressLog {
    fn on_progress(&mut self, fraction: f64) {
        self.0.lock().unwrap().push(fraction);
    }
}

#[tokio::test]
async fn test_progress_counts_failed_queries() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = config(
        &["devops alpha", "unknown query", "devops beta", "also unknown"],
        dir.path().join("sent_emails.txt"),
    );
    let progress = ProgressLog::default();
    let mut ctx = RunContext::new(100).with_listener(Box::new(progress.clone()));
    let courier = Courier::new(shared(search()), shared(web()), shared(Outbox::default()));

    let summary = run_pipeline(&cfg, &courier, &mut ctx).await.unwrap();

    assert_eq!(*progress.0.lock().unwrap(), vec![0.25, 0.5, 0.75, 1.0]);
    assert_eq!(summary.queries_processed, 4);
    assert_eq!(summary.queries_failed, 2);
    assert_eq!(summary.sent, 4);
}

#[tokio::test]
async fn test_unwritable_ledger_aborts_run() {
    let dir = tempfile::tempdir().unwrap();
    // A directory where the ledger file should be: loading and appending both fail.
    let ledger_path = dir.path().join("sent_emails.txt");
    std::fs::create_dir(&ledger_path).unwrap();

    let outbox = shared(Outbox::default());
    let courier = Courier::new(shared(search()), shared(web()), outbox.clone());
    let cfg = config(&["devops beta"], ledger_path);

    let result = run_pipeline(&cfg, &courier, &mut RunContext::new(100)).await;

    assert!(matches!(result, Err(AppError::Ledger(_))));
}

#[tokio::test]
async fn test_refused_address_is_attempted_once_per_run() {
    let dir = tempfile::tempdir().unwrap();
    let ledger_path = dir.path().join("sent_emails.txt");
    let search = ScriptedSearch::default()
        .with("devops gamma", &["https://gamma.io/jobs"])
        .with("devops delta", &["https://delta.io/jobs"]);
    let web = StaticWeb::default()
        .page("https://gamma.io/jobs", "Recruiting: hr@acme.io")
        .page("https://delta.io/jobs", "Questions? hr@acme.io or ops@delta.io");
    let outbox = shared(Outbox {
        refuse: HashSet::from(["hr@acme.io".to_string()]),
        ..Outbox::default()
    });
    let courier = Courier::new(shared(search), shared(web), outbox.clone());
    let cfg = config(&["devops gamma", "devops delta"], ledger_path.clone());
    let mut ctx = RunContext::new(100);

    let summary = run_pipeline(&cfg, &courier, &mut ctx).await.unwrap();

    assert_eq!(outbox.attempts(), vec!["hr@acme.io", "ops@delta.io"]);
    assert_eq!(summary.send_failed, 1);
    assert_eq!(summary.skipped_duplicate, 1);
    assert_eq!(summary.sent, 1);
    assert!(!FileLedger::open(&ledger_path)
        .unwrap()
        .contains("hr@acme.io"));
    assert!(ctx
        .entries()
        .any(|e| e.message == "⚠️ Skipping hr@acme.io, delivery already failed in this run."));
}

#[tokio::test]
async fn test_torn_ledger_tail_is_not_resent() {
    let dir = tempfile::tempdir().unwrap();
    let ledger_path = dir.path().join("sent_emails.txt");
    // Last line written without its newline.
    std::fs::write(&ledger_path, "hr@alpha.io").unwrap();
    let cfg = config(&["devops alpha"], ledger_path.clone());

    let first = shared(Outbox::default());
    let courier = Courier::new(shared(search()), shared(web()), first.clone());
    run_pipeline(&cfg, &courier, &mut RunContext::new(100))
        .await
        .unwrap();
    assert_eq!(first.attempts(), vec!["talent@alpha.io", "office@alpha.io"]);

    let second = shared(Outbox::default());
    let courier = Courier::new(shared(search()), shared(web()), second.clone());
    run_pipeline(&cfg, &courier, &mut RunContext::new(100))
        .await
        .unwrap();
    assert!(second.attempts().is_empty());
}
