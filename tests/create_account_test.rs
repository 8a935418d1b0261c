use std::sync::Mutex;

use async_trait::async_trait;
use clap::Parser;
use eosio_newaccount::{
    run, Action, CommandArguments, Outcome, RpcError, SubmissionPolicy, SubmitError,
    TransactResult, TransactionSubmitter,
};

/// Records every call and answers with a canned result
struct StubSubmitter {
    calls: Mutex<Vec<(Vec<Action>, SubmissionPolicy)>>,
    response: Result<String, String>,
}

impl StubSubmitter {
    fn succeeding(transaction_id: &str) -> Self {
        StubSubmitter {
            calls: Mutex::new(vec![]),
            response: Ok(transaction_id.to_string()),
        }
    }

    fn failing(message: &str) -> Self {
        StubSubmitter {
            calls: Mutex::new(vec![]),
            response: Err(message.to_string()),
        }
    }

    fn calls(&self) -> Vec<(Vec<Action>, SubmissionPolicy)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl TransactionSubmitter for StubSubmitter {
    async fn submit(
        &self,
        actions: &[Action],
        policy: SubmissionPolicy,
    ) -> Result<TransactResult, SubmitError> {
        self.calls.lock().unwrap().push((actions.to_vec(), policy));

        match &self.response {
            Ok(id) => Ok(TransactResult {
                transaction_id: id.clone(),
                processed: serde_json::Value::Null,
            }),
            Err(message) => Err(SubmitError::Rpc(RpcError::RequestFailed(message.clone()))),
        }
    }
}

const FLAGS: [(&str, &str); 5] = [
    ("--url", "http://localhost:8888"),
    (
        "--private-key",
        "5KQwrPbwdL6PhXujxW37FSSQZ1JiwsST4cqQzDeyXtP79zkvFD3",
    ),
    ("--new-account-name", "testacct1"),
    ("--owner-pub-key", "PUB_OWNER"),
    ("--active-pub-key", "PUB_ACTIVE"),
];

fn argv_without(skip: Option<usize>) -> Vec<&'static str> {
    let mut argv = vec!["eosio-newaccount"];
    for (i, (flag, value)) in FLAGS.iter().enumerate() {
        if Some(i) != skip {
            argv.push(*flag);
            argv.push(*value);
        }
    }
    argv
}

fn full_args() -> CommandArguments {
    CommandArguments::try_parse_from(argv_without(None)).unwrap()
}

async fn run_captured(
    args: &CommandArguments,
    submitter: &StubSubmitter,
) -> (Outcome, String, String) {
    let mut out = Vec::new();
    let mut err = Vec::new();
    let outcome = run(args, submitter, &mut out, &mut err).await;
    (
        outcome,
        String::from_utf8(out).unwrap(),
        String::from_utf8(err).unwrap(),
    )
}

#[tokio::test]
async fn test_missing_flag_never_submits() {
    let submitter = StubSubmitter::succeeding("abc123");

    for skip in 0..FLAGS.len() {
        match CommandArguments::try_parse_from(argv_without(Some(skip))) {
            Ok(args) => {
                run_captured(&args, &submitter).await;
                panic!("parsing succeeded without {}", FLAGS[skip].0);
            }
            Err(err) => {
                assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
                // clap reports usage errors with exit status 2
                assert_eq!(err.exit_code(), 2);
            }
        }
    }

    assert!(submitter.calls().is_empty());
}

#[tokio::test]
async fn test_success_prints_transaction_id() {
    let submitter = StubSubmitter::succeeding("abc123");
    let (outcome, out, err) = run_captured(&full_args(), &submitter).await;

    assert_eq!(
        outcome,
        Outcome::Submitted {
            transaction_id: "abc123".to_string()
        }
    );
    assert!(err.is_empty());

    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0], "Create new account:  testacct1 PUB_OWNER PUB_ACTIVE");
    assert_eq!(lines[1], "Transaction id:  abc123");

    let calls = submitter.calls();
    assert_eq!(calls.len(), 1);
    let (actions, policy) = &calls[0];
    assert_eq!(actions.len(), 1);
    assert_eq!(policy.blocks_behind, 3);
    assert_eq!(policy.expire_seconds, 30);
}

#[tokio::test]
async fn test_failure_reported_once_on_stderr() {
    let submitter = StubSubmitter::failing("connection refused");
    let (outcome, out, err) = run_captured(&full_args(), &submitter).await;

    assert_eq!(outcome, Outcome::Failed);
    assert!(!outcome.is_success());

    assert_eq!(out.lines().count(), 1);
    assert!(out.starts_with("Create new account:"));

    let lines: Vec<&str> = err.lines().collect();
    assert_eq!(lines.len(), 1);
    assert_eq!(
        lines[0],
        "Transaction exception:  chain API request failed: connection refused"
    );

    assert_eq!(submitter.calls().len(), 1);
}

#[tokio::test]
async fn test_submitted_action_payload() {
    let submitter = StubSubmitter::succeeding("echo");
    run_captured(&full_args(), &submitter).await;

    let calls = submitter.calls();
    let action = &calls[0].0[0];

    assert_eq!(action.account, "eosio");
    assert_eq!(action.name, "newaccount");
    assert_eq!(
        serde_json::to_value(&action.authorization).unwrap(),
        serde_json::json!([{ "actor": "eosio", "permission": "active" }])
    );
    assert_eq!(
        serde_json::to_string(&action.data).unwrap(),
        r#"{"creator":"eosio","name":"testacct1","owner":{"threshold":1,"keys":[{"key":"PUB_OWNER","weight":1}],"accounts":[],"waits":[]},"active":{"threshold":1,"keys":[{"key":"PUB_ACTIVE","weight":1}],"accounts":[],"waits":[]}}"#
    );
}

#[test]
fn test_runs_on_plain_executor() {
    let submitter = StubSubmitter::succeeding("sync");
    let (outcome, _, _) = tokio_test::block_on(run_captured(&full_args(), &submitter));
    assert!(outcome.is_success());
}
