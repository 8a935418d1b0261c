// Account creation command: parse, build, submit, report

use std::io::Write;

use crate::api::TransactionSubmitter;
use crate::config::SubmissionPolicy;
use crate::models::Action;

/// Create a new account on an EOSIO chain
#[derive(Debug, Clone, clap::Parser)]
#[clap(name = "eosio-newaccount")]
pub struct CommandArguments {
    /// EOSIO API URL
    #[clap(long)]
    pub url: String,

    /// Private key for signing transaction
    #[clap(long)]
    pub private_key: String,

    /// New account name
    #[clap(long)]
    pub new_account_name: String,

    /// Owner public key
    #[clap(long)]
    pub owner_pub_key: String,

    /// Active public key
    #[clap(long)]
    pub active_pub_key: String,
}

impl CommandArguments {
    pub fn action(&self) -> Action {
        Action::new_account(
            &self.new_account_name,
            &self.owner_pub_key,
            &self.active_pub_key,
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Submitted { transaction_id: String },
    Failed,
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Submitted { .. })
    }
}

/// Submit the `newaccount` action once and report the result.
///
/// Writes one line to `out` before submitting, then either the
/// transaction id to `out` or the error to `err`. Submission errors are
/// reported here and never propagated.
pub async fn run<S, O, E>(
    args: &CommandArguments,
    submitter: &S,
    out: &mut O,
    err: &mut E,
) -> Outcome
where
    S: TransactionSubmitter + ?Sized,
    O: Write,
    E: Write,
{
    let _ = writeln!(
        out,
        "Create new account:  {} {} {}",
        args.new_account_name, args.owner_pub_key, args.active_pub_key
    );

    let action = args.action();
    match submitter.submit(&[action], SubmissionPolicy::default()).await {
        Ok(result) => {
            let _ = writeln!(out, "Transaction id:  {}", result.transaction_id);
            Outcome::Submitted {
                transaction_id: result.transaction_id,
            }
        }
        Err(e) => {
            let _ = writeln!(err, "Transaction exception:  {}", e);
            Outcome::Failed
        }
    }
}
