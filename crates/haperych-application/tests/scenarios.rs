mod common;

use std::path::PathBuf;

use haperych_application::capture::{CANCEL_LABEL, CONTINUE_LABEL};
use haperych_application::flow::stale_button;
use haperych_core::chat::{Outgoing, Reply};
use haperych_core::ledger::{NewLoan, Settlement};
use haperych_core::report::{GroupingKey, ReportPeriod};
use haperych_core::session::{Session, SessionMode};
use haperych_core::token::{Token, decode_text};

use common::{Call, day, harness};

fn tokens(reply: &Reply) -> Vec<String> {
    reply[0]
        .choices()
        .iter()
        .map(|c| c.token.as_str().to_string())
        .collect()
}

fn last_text(reply: &Reply) -> &str {
    match reply.last() {
        Some(Outgoing::Text { text, .. }) => text,
        other => panic!("expected text, got {other:?}"),
    }
}

#[tokio::test]
async fn scenario_1_loan_stage_one_offers_legends() {
    let h = harness();
    let mut session = Session::new(1);

    let reply = h.router.route_button(&mut session, "loan_3").await.unwrap();
    assert_eq!(tokens(&reply), vec!["loan_3_7"]);
    assert_eq!(reply[0].choices()[0].label, "Car repair");
    assert!(session.mode().is_idle());
}

#[tokio::test]
async fn scenario_2_overpayment_settles_in_full() {
    let h = harness();
    let mut session = Session::new(1);

    let reply = h
        .router
        .route_button(&mut session, "payback_12_2024-05-01_6000")
        .await
        .unwrap();

    assert_eq!(
        h.ledger.calls(),
        vec![Call::Settle(Settlement::Full {
            loan_id: 12,
            settle_date: day(5, 1),
        })]
    );
    assert_eq!(last_text(&reply), "Loan #12 settled on 2024-05-01.");
    assert!(session.mode().is_idle());
}

#[tokio::test]
async fn scenario_3_partial_payment_extends() {
    let h = harness();
    let mut session = Session::new(1);

    let reply = h
        .router
        .route_button(&mut session, "payback_12_2024-05-01_3000")
        .await
        .unwrap();
    assert!(h.ledger.calls().is_empty());
    assert_eq!(
        session.mode().pending_token(),
        Some(&Token::new("payback_12_2024-05-01_3000"))
    );
    // 10% of the remaining 2000
    assert!(tokens(&reply).contains(&"payback_12_2024-05-01_3000_200".to_string()));

    let reply = h
        .router
        .route_button(&mut session, "payback_12_2024-05-01_3000_500")
        .await
        .unwrap();
    assert!(session.mode().is_idle());
    assert_eq!(tokens(&reply)[0], "payback_12_2024-05-01_3000_500_2024-05-08");

    h.router
        .route_button(&mut session, "payback_12_2024-05-01_3000_500_2024-05-08")
        .await
        .unwrap();
    assert_eq!(
        h.ledger.calls(),
        vec![Call::Settle(Settlement::Extension {
            loan_id: 12,
            settle_date: day(5, 1),
            amount: 3000,
            new_reward: 500,
            new_expected_settle_date: day(5, 8),
        })]
    );
    assert!(session.mode().is_idle());
}

#[tokio::test]
async fn exact_payment_settles_in_full() {
    let h = harness();
    let mut session = Session::new(1);

    h.router
        .route_button(&mut session, "payback_12_2024-05-03_5000")
        .await
        .unwrap();
    assert!(matches!(
        h.ledger.calls()[..],
        [Call::Settle(Settlement::Full { loan_id: 12, .. })]
    ));
}

#[tokio::test]
async fn scenario_4_alias_capture_adds_source_once() {
    let h = harness();
    let mut session = Session::new(1);

    let reply = h.router.route_text(&mut session, "Add source").await.unwrap();
    assert_eq!(last_text(&reply), "Name of the new source?");
    assert_eq!(session.mode().pending_alias(), Some("source"));

    h.router.route_text(&mut session, "Новый Банк").await.unwrap();
    assert_eq!(h.ledger.calls(), vec![Call::AddSource("Новый Банк".into())]);
    assert!(session.mode().is_idle());

    // Next text goes to the default flow, not to the source flow again.
    let reply = h.router.route_text(&mut session, "Ещё банк").await.unwrap();
    assert_eq!(h.ledger.calls().len(), 1);
    assert_eq!(tokens(&reply), vec!["payback_12"]);
}

#[tokio::test]
async fn scenario_5_token_capture_offers_cancel_and_continue() {
    let h = harness();
    let mut session = Session::new(1);
    let pending = Token::new("loan_3_7_2024-05-01_2024-06-01");
    session.arm_append(pending.clone());

    let reply = h.router.route_text(&mut session, "4500").await.unwrap();
    let choices = reply[0].choices();
    assert_eq!(choices[0].label, CANCEL_LABEL);
    assert_eq!(choices[0].token, pending);
    assert_eq!(choices[1].label, CONTINUE_LABEL);
    assert_eq!(choices[1].token.as_str(), "loan_3_7_2024-05-01_2024-06-01_4500");
    assert!(session.mode().is_idle());
}

#[tokio::test]
async fn cancel_is_idempotent() {
    let h = harness();
    let mut session = Session::new(1);
    let pending = "loan_3_7_2024-05-01_2024-06-01";

    let first = h.router.route_button(&mut session, pending).await.unwrap();
    let mode_after_first = session.mode().clone();
    let second = h.router.route_button(&mut session, pending).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(session.mode(), &mode_after_first);
    assert_eq!(
        mode_after_first,
        SessionMode::AwaitingAppend {
            token: Token::new(pending)
        }
    );
    assert!(h.ledger.calls().is_empty());
}

#[tokio::test]
async fn full_loan_flow_creates_loan() {
    let h = harness();
    let mut session = Session::new(1);

    let reply = h.router.route_text(&mut session, "New loan").await.unwrap();
    assert_eq!(tokens(&reply), vec!["loan_3", "loan_4"]);

    let reply = h
        .router
        .route_button(&mut session, "loan_3_7")
        .await
        .unwrap();
    let dates = tokens(&reply);
    assert_eq!(dates.len(), 15);
    assert_eq!(dates[0], "loan_3_7_2024-05-03");
    assert_eq!(dates[14], "loan_3_7_2024-05-17");

    let reply = h
        .router
        .route_button(&mut session, "loan_3_7_2024-05-09")
        .await
        .unwrap();
    assert_eq!(tokens(&reply)[0], "loan_3_7_2024-05-09_2024-05-15");
    assert_eq!(tokens(&reply).len(), 8);

    h.router
        .route_button(&mut session, "loan_3_7_2024-05-09_2024-06-01")
        .await
        .unwrap();
    assert!(session.mode().pending_token().is_some());

    let reply = h.router.route_text(&mut session, "4500").await.unwrap();
    let continue_token = reply[0].choices()[1].token.clone();

    let reply = h
        .router
        .route_button(&mut session, continue_token.as_str())
        .await
        .unwrap();
    assert!(tokens(&reply).contains(&"loan_3_7_2024-05-09_2024-06-01_4500_450".to_string()));

    let reply = h
        .router
        .route_button(&mut session, "loan_3_7_2024-05-09_2024-06-01_4500_450")
        .await
        .unwrap();
    assert_eq!(
        h.ledger.calls(),
        vec![Call::CreateLoan(NewLoan {
            source_id: 3,
            legend_id: 7,
            loan_date: day(5, 9),
            expected_settle_date: day(6, 1),
            amount: 4500,
            reward: 450,
            comment: None,
            previous_loan_id: None,
        })]
    );
    assert_eq!(last_text(&reply), "Loan #100 saved: 4950 due 2024-06-01.");
    assert!(session.mode().is_idle());
}

#[tokio::test]
async fn store_failure_resets_and_reports() {
    let h = harness();
    *h.ledger.fail_writes.lock().unwrap() = true;
    let mut session = Session::new(1);
    session.arm_append(Token::new("loan_3_7"));

    let reply = h
        .router
        .route_button(&mut session, "loan_3_7_2024-05-09_2024-06-01_4500_450")
        .await
        .unwrap();
    assert_eq!(last_text(&reply), "Could not save the loan.");
    assert!(session.mode().is_idle());
    assert!(h.ledger.calls().is_empty());
}

#[tokio::test]
async fn malformed_argument_truncates_and_reasks() {
    let h = harness();
    let mut session = Session::new(1);

    // Second id is not a number: stage 1 is asked again for `loan_3`.
    let reply = h
        .router
        .route_button(&mut session, "loan_3_x_2024-05-01")
        .await
        .unwrap();
    assert_eq!(tokens(&reply), vec!["loan_3_7"]);
    assert!(h.ledger.calls().is_empty());
}

#[tokio::test]
async fn huge_amount_is_asked_again() {
    let h = harness();
    let mut session = Session::new(1);
    let asked = "loan_3_7_2024-05-09_2024-06-01";

    let reply = h
        .router
        .route_button(&mut session, &format!("{asked}_9223372036854775807"))
        .await
        .unwrap();
    assert!(tokens(&reply).iter().all(|t| t.starts_with(&format!("{asked}_"))));
    assert_eq!(session.mode().pending_token(), Some(&Token::new(asked)));

    // Typing the same number is refused before a token is built.
    let reply = h
        .router
        .route_text(&mut session, "9223372036854775807")
        .await
        .unwrap();
    assert_eq!(tokens(&reply), vec![asked]);
    assert_eq!(reply[0].choices()[0].label, CANCEL_LABEL);
    assert!(h.ledger.calls().is_empty());
}

#[tokio::test]
async fn zero_payment_is_asked_again() {
    let h = harness();
    let mut session = Session::new(1);

    let reply = h
        .router
        .route_button(&mut session, "payback_12_2024-05-01_0")
        .await
        .unwrap();
    assert_eq!(tokens(&reply)[0], "payback_12_2024-05-01_5000");
    assert_eq!(
        session.mode().pending_token(),
        Some(&Token::new("payback_12_2024-05-01"))
    );
    assert!(h.ledger.calls().is_empty());
}

#[tokio::test]
async fn zero_reward_is_accepted() {
    let h = harness();
    let mut session = Session::new(1);

    let reply = h
        .router
        .route_button(&mut session, "loan_3_7_2024-05-09_2024-06-01_4500_0")
        .await
        .unwrap();
    assert_eq!(last_text(&reply), "Loan #100 saved: 4500 due 2024-06-01.");
}

#[tokio::test]
async fn overflowing_token_is_stale() {
    let h = harness();
    let mut session = Session::new(1);
    session.arm_alias("source");

    let reply = h
        .router
        .route_button(&mut session, "comment_12_aGk=_extra")
        .await
        .unwrap();
    assert_eq!(reply, vec![stale_button()]);
    assert!(session.mode().is_idle());
    assert!(h.ledger.calls().is_empty());
}

#[tokio::test]
async fn unknown_prefix_is_a_routing_error() {
    let h = harness();
    let mut session = Session::new(1);
    let err = h
        .router
        .route_button(&mut session, "bogus_1_2")
        .await
        .unwrap_err();
    assert!(err.is_unknown_flow());
}

#[tokio::test]
async fn comment_text_is_escaped_through_the_token() {
    let h = harness();
    let mut session = Session::new(1);

    h.router
        .route_button(&mut session, "comment_12")
        .await
        .unwrap();
    assert_eq!(
        session.mode().pending_token(),
        Some(&Token::new("comment_12"))
    );

    let reply = h
        .router
        .route_text(&mut session, "paid_in cash")
        .await
        .unwrap();
    let continue_token = reply[0].choices()[1].token.clone();
    assert_eq!(
        decode_text(continue_token.raw_args()[1]).unwrap(),
        "paid_in cash"
    );

    h.router
        .route_button(&mut session, continue_token.as_str())
        .await
        .unwrap();
    assert_eq!(
        h.ledger.calls(),
        vec![Call::Comment(12, "paid_in cash".into())]
    );
}

#[tokio::test]
async fn analytics_all_time_skips_the_month() {
    let h = harness();
    *h.reporter.paths.lock().unwrap() = vec![PathBuf::from("/tmp/source_all_00_bank.svg")];
    let mut session = Session::new(1);

    let reply = h
        .router
        .route_button(&mut session, "analytics_source_-1")
        .await
        .unwrap();
    assert!(matches!(&reply[0], Outgoing::Images { paths } if paths.len() == 1));
    assert_eq!(
        h.reporter.requests.lock().unwrap()[..],
        [(GroupingKey::Source, ReportPeriod::all_time())]
    );
}

#[tokio::test]
async fn analytics_month_report_without_data() {
    let h = harness();
    let mut session = Session::new(1);

    let reply = h
        .router
        .route_button(&mut session, "analytics_legend_2024")
        .await
        .unwrap();
    assert_eq!(reply[0].choices().len(), 13);

    let reply = h
        .router
        .route_button(&mut session, "analytics_legend_2024_5")
        .await
        .unwrap();
    assert_eq!(last_text(&reply), "No data for that period.");
    assert_eq!(
        h.reporter.requests.lock().unwrap()[..],
        [(GroupingKey::Legend, ReportPeriod::month(2024, 5))]
    );
}

#[tokio::test]
async fn menu_label_resets_pending_capture() {
    let h = harness();
    let mut session = Session::new(1);
    session.arm_append(Token::new("loan_3_7_2024-05-01_2024-06-01"));

    // Armed capture wins over the label.
    let reply = h.router.route_text(&mut session, "Pay back").await.unwrap();
    assert_eq!(reply[0].choices().len(), 1);
    assert!(session.mode().is_idle());

    let reply = h.router.route_text(&mut session, "Pay back").await.unwrap();
    assert_eq!(tokens(&reply), vec!["payback_12"]);
}

#[tokio::test]
async fn at_most_one_capture_after_each_event() {
    let h = harness();
    let mut session = Session::new(1);

    h.router.route_text(&mut session, "Add legend").await.unwrap();
    assert_eq!(session.mode().pending_alias(), Some("legend"));

    // A button press replaces the alias capture with the flow's own.
    h.router
        .route_button(&mut session, "payback_12_2024-05-01")
        .await
        .unwrap();
    assert_eq!(session.mode().pending_alias(), None);
    assert_eq!(
        session.mode().pending_token(),
        Some(&Token::new("payback_12_2024-05-01"))
    );
}
