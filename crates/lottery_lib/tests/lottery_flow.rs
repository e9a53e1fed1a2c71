use lottery_lib::{
    LotteryError,
    draw::{claim_prize, conduct_draw, list_winners},
    registry::{list_participants, register_participant},
    rounds::{get_status, find_round_by_number},
    storage::{open_in_memory, payments::insert_payment, rounds as round_rows},
    types::{NewPayment, PaymentMetadata, PaymentStatus, PaymentType, Registration},
};
use rand::{SeedableRng, rngs::StdRng};
use rusqlite::Connection;
use std::collections::HashSet;

fn pay(conn: &Connection, amount: i64, status: PaymentStatus, kind: PaymentType) -> i64 {
    let n: i64 = conn
        .query_row("SELECT COUNT(*) FROM payments", [], |r| r.get(0))
        .unwrap();
    insert_payment(
        conn,
        &NewPayment {
            payment_intent_id: format!("pi_test_{}", n + 1),
            amount,
            currency: "usd".into(),
            status,
            payment_type: kind,
            customer_email: None,
            metadata: PaymentMetadata::default(),
        },
    )
    .unwrap()
}

fn invest(conn: &Connection, amount: i64) -> i64 {
    pay(conn, amount, PaymentStatus::Succeeded, PaymentType::Investment)
}

fn register(
    conn: &mut Connection,
    payment_id: i64,
    amount: i64,
    email: &str,
) -> lottery_lib::types::Participant {
    let mut rng = StdRng::seed_from_u64(payment_id as u64);
    register_participant(
        conn,
        &Registration {
            payment_id: Some(payment_id),
            amount,
            email: Some(email.into()),
        },
        &mut rng,
    )
    .unwrap()
}

#[test]
fn end_to_end_round_one() {
    let mut conn = open_in_memory().unwrap();

    let status = get_status(&mut conn).unwrap();
    assert_eq!(status.current_round, 1);
    assert_eq!(status.total_prize_fund, 0);
    assert_eq!(status.total_participants, 0);

    let pa = invest(&conn, 3_000);
    let pb = invest(&conn, 500);
    let a = register(&mut conn, pa, 3_000, "a@example.com");
    let b = register(&mut conn, pb, 500, "b@example.com");
    assert_eq!(a.ticket_numbers.len(), 3);
    assert_eq!(b.ticket_numbers.len(), 1);
    assert_eq!(a.lottery_round, 1);

    let listed = list_participants(&conn, None).unwrap();
    assert_eq!(listed.round, 1);
    assert_eq!(listed.total_participants, 2);
    assert_eq!(listed.total_tickets, 4);
    // newest first
    assert_eq!(listed.participants[0].id, b.id);
    assert_eq!(listed.participants[1].ticket_numbers, a.ticket_numbers);

    let status = get_status(&mut conn).unwrap();
    assert_eq!(status.total_investment, 3_500);
    assert_eq!(status.prize_fund.first, 350);
    assert_eq!(status.prize_fund.second, 105);
    assert_eq!(status.prize_fund.third, 35);
    assert_eq!(status.total_participants, 2);
    assert_eq!(status.total_tickets, 4);

    let pool: HashSet<String> = a
        .ticket_numbers
        .iter()
        .chain(b.ticket_numbers.iter())
        .cloned()
        .collect();

    let mut rng = StdRng::seed_from_u64(99);
    let outcome = conduct_draw(&mut conn, None, &mut rng).unwrap();
    assert_eq!(outcome.round, 1);
    assert_eq!(outcome.winners.len(), 3);
    assert_eq!(outcome.participant_count, 2);
    assert_eq!(outcome.ticket_count, 4);
    assert_eq!(outcome.next_round.round_number, 2);

    let mut seen = HashSet::new();
    for (w, expected) in outcome.winners.iter().zip([350, 105, 35]) {
        assert!(pool.contains(&w.winning_ticket));
        assert!(seen.insert(w.winning_ticket.clone()));
        assert_eq!(w.prize_amount, expected);
        assert!(!w.claimed);
    }

    let status = get_status(&mut conn).unwrap();
    assert_eq!(status.current_round, 2);
    assert!(status.is_active);
    assert_eq!(round_rows::count_active(&conn).unwrap(), 1);

    let closed = find_round_by_number(&conn, 1).unwrap();
    assert!(!closed.is_active);
    assert!(closed.draw_date.is_some());

    let stored = list_winners(&conn, Some(1)).unwrap();
    assert_eq!(stored.total_winners, 3);
    assert_eq!(stored.winners, outcome.winners);
    assert!(list_winners(&conn, None).unwrap().winners.is_empty());
}

#[test]
fn second_draw_of_same_round_is_rejected_without_changes() {
    let mut conn = open_in_memory().unwrap();
    let p = invest(&conn, 5_000);
    register(&mut conn, p, 5_000, "a@example.com");
    let round_id = get_status(&mut conn).unwrap().round_id;

    let mut rng = StdRng::seed_from_u64(5);
    let first = conduct_draw(&mut conn, Some(round_id), &mut rng).unwrap();

    let err = conduct_draw(&mut conn, Some(round_id), &mut rng).unwrap_err();
    assert!(matches!(err, LotteryError::AlreadyDrawn { round: 1 }));
    assert_eq!(err.status_code(), 409);

    assert_eq!(list_winners(&conn, Some(1)).unwrap().winners, first.winners);
    assert_eq!(round_rows::max_round_number(&conn).unwrap(), 2);
    assert_eq!(round_rows::count_active(&conn).unwrap(), 1);
}

#[test]
fn scarce_tickets_shrink_the_winner_list() {
    let mut conn = open_in_memory().unwrap();
    let p1 = invest(&conn, 1_000);
    let p2 = invest(&conn, 700);
    register(&mut conn, p1, 1_000, "a@example.com");
    register(&mut conn, p2, 700, "b@example.com");

    let mut rng = StdRng::seed_from_u64(3);
    let outcome = conduct_draw(&mut conn, None, &mut rng).unwrap();
    let positions: Vec<u8> = outcome
        .winners
        .iter()
        .map(|w| w.prize_position.number())
        .collect();
    assert_eq!(positions, vec![1, 2]);
    assert_ne!(
        outcome.winners[0].winning_ticket,
        outcome.winners[1].winning_ticket
    );
}

#[test]
fn draw_without_participants_changes_nothing() {
    let mut conn = open_in_memory().unwrap();
    get_status(&mut conn).unwrap();

    let mut rng = StdRng::seed_from_u64(1);
    let err = conduct_draw(&mut conn, None, &mut rng).unwrap_err();
    assert!(matches!(err, LotteryError::NoParticipants { round: 1 }));
    assert_eq!(round_rows::max_round_number(&conn).unwrap(), 1);
    assert!(find_round_by_number(&conn, 1).unwrap().is_active);
}

#[test]
fn draw_of_unknown_round_is_invalid_input() {
    let mut conn = open_in_memory().unwrap();
    let mut rng = StdRng::seed_from_u64(1);
    let err = conduct_draw(&mut conn, Some(404), &mut rng).unwrap_err();
    assert!(matches!(err, LotteryError::InvalidInput(_)));
}

#[test]
fn registration_rejects_bad_requests() {
    let mut conn = open_in_memory().unwrap();
    let good = invest(&conn, 2_000);
    let donation = pay(&conn, 2_000, PaymentStatus::Succeeded, PaymentType::Donation);
    let pending = pay(&conn, 2_000, PaymentStatus::Pending, PaymentType::Investment);
    let mut rng = StdRng::seed_from_u64(0);

    let cases = [
        Registration {
            payment_id: None,
            amount: 2_000,
            email: None,
        },
        Registration {
            payment_id: Some(9_999),
            amount: 2_000,
            email: None,
        },
        Registration {
            payment_id: Some(donation),
            amount: 2_000,
            email: None,
        },
        Registration {
            payment_id: Some(pending),
            amount: 2_000,
            email: None,
        },
        Registration {
            payment_id: Some(good),
            amount: 0,
            email: None,
        },
        Registration {
            payment_id: Some(good),
            amount: 2_000,
            email: Some("not-an-email".into()),
        },
        Registration {
            payment_id: Some(good),
            amount: 200_000,
            email: None,
        },
        Registration {
            payment_id: Some(good),
            amount: i64::MAX,
            email: None,
        },
    ];
    for case in &cases {
        let err = register_participant(&mut conn, case, &mut rng).unwrap_err();
        assert!(
            matches!(err, LotteryError::InvalidInput(_)),
            "{:?} -> {:?}",
            case,
            err
        );
    }
    assert_eq!(list_participants(&conn, None).unwrap().total_participants, 0);

    register(&mut conn, good, 2_000, "a@example.com");
    let dup = register_participant(
        &mut conn,
        &Registration {
            payment_id: Some(good),
            amount: 2_000,
            email: None,
        },
        &mut rng,
    )
    .unwrap_err();
    assert!(matches!(dup, LotteryError::InvalidInput(_)));
    assert_eq!(list_participants(&conn, None).unwrap().total_participants, 1);
}

#[test]
fn email_falls_back_to_payment_details() {
    let mut conn = open_in_memory().unwrap();
    let mut metadata = PaymentMetadata::default();
    metadata.insert(PaymentMetadata::EMAIL, "meta@example.com");
    metadata.insert(PaymentMetadata::SOURCE, "web");
    let with_meta = insert_payment(
        &conn,
        &NewPayment {
            payment_intent_id: "pi_meta".into(),
            amount: 1_500,
            currency: "usd".into(),
            status: PaymentStatus::Succeeded,
            payment_type: PaymentType::Investment,
            customer_email: None,
            metadata,
        },
    )
    .unwrap();
    let with_customer = insert_payment(
        &conn,
        &NewPayment {
            payment_intent_id: "pi_customer".into(),
            amount: 1_500,
            currency: "usd".into(),
            status: PaymentStatus::Succeeded,
            payment_type: PaymentType::Investment,
            customer_email: Some("customer@example.com".into()),
            metadata: PaymentMetadata::default(),
        },
    )
    .unwrap();

    let mut rng = StdRng::seed_from_u64(8);
    let a = register_participant(
        &mut conn,
        &Registration {
            payment_id: Some(with_meta),
            amount: 1_500,
            email: None,
        },
        &mut rng,
    )
    .unwrap();
    let b = register_participant(
        &mut conn,
        &Registration {
            payment_id: Some(with_customer),
            amount: 1_500,
            email: Some("  ".into()),
        },
        &mut rng,
    )
    .unwrap();
    assert_eq!(a.participant_email.as_deref(), Some("meta@example.com"));
    assert_eq!(b.participant_email.as_deref(), Some("customer@example.com"));
    assert_eq!(a.payment_intent_id.as_deref(), Some("pi_meta"));
}

#[test]
fn fund_counts_only_investments_registered_in_the_round() {
    let mut conn = open_in_memory().unwrap();
    let big = invest(&conn, 100_000);
    pay(&conn, 50_000, PaymentStatus::Succeeded, PaymentType::Donation);
    pay(&conn, 50_000, PaymentStatus::Failed, PaymentType::Investment);

    // Paid but not registered yet: no tickets, no fund.
    let status = get_status(&mut conn).unwrap();
    assert_eq!(status.total_investment, 0);
    assert_eq!(status.total_prize_fund, 0);

    register(&mut conn, big, 100_000, "a@example.com");
    let status = get_status(&mut conn).unwrap();
    assert_eq!(status.total_investment, 100_000);
    assert_eq!(
        (status.prize_fund.first, status.prize_fund.second, status.prize_fund.third),
        (10_000, 3_000, 1_000)
    );

    // Registered after the last refresh; the draw still counts it.
    let p = invest(&conn, 2_000);
    register(&mut conn, p, 2_000, "b@example.com");
    let mut rng = StdRng::seed_from_u64(11);
    let outcome = conduct_draw(&mut conn, None, &mut rng).unwrap();
    assert_eq!(outcome.winners.len(), 3);
    assert_eq!(outcome.winners[0].prize_amount, 10_200);
    assert_eq!(find_round_by_number(&conn, 1).unwrap().total_investment_amount, 102_000);

    let status = get_status(&mut conn).unwrap();
    assert_eq!(status.current_round, 2);
    assert_eq!(status.total_investment, 0);
}

#[test]
fn late_registration_funds_the_round_it_joins() {
    let mut conn = open_in_memory().unwrap();
    let early = invest(&conn, 1_000);
    register(&mut conn, early, 1_000, "a@example.com");
    // Paid during round 1, registered only after its draw.
    let late = invest(&conn, 50_000);

    let mut rng = StdRng::seed_from_u64(4);
    let outcome = conduct_draw(&mut conn, None, &mut rng).unwrap();
    assert_eq!(outcome.winners.len(), 1);
    assert_eq!(outcome.winners[0].prize_amount, 100);

    let joined = register(&mut conn, late, 50_000, "late@example.com");
    assert_eq!(joined.lottery_round, 2);

    let status = get_status(&mut conn).unwrap();
    assert_eq!(status.current_round, 2);
    assert_eq!(status.total_investment, 50_000);
    assert_eq!(status.prize_fund.first, 5_000);
    assert_eq!(status.total_participants, 1);
    assert_eq!(find_round_by_number(&conn, 1).unwrap().total_investment_amount, 1_000);
}

#[test]
fn failure_mid_draw_rolls_back_everything() {
    let mut conn = open_in_memory().unwrap();
    for amount in [3_000, 2_000] {
        let p = invest(&conn, amount);
        register(&mut conn, p, amount, "a@example.com");
    }
    conn.execute_batch(
        "CREATE TRIGGER fail_second_prize BEFORE INSERT ON lottery_winners
         WHEN NEW.prize_position = 2
         BEGIN SELECT RAISE(ABORT, 'second prize rejected'); END;",
    )
    .unwrap();

    let mut rng = StdRng::seed_from_u64(8);
    let err = conduct_draw(&mut conn, None, &mut rng).unwrap_err();
    assert!(matches!(err, LotteryError::DrawFailed { round: 1, .. }), "{:?}", err);

    assert_eq!(list_winners(&conn, Some(1)).unwrap().total_winners, 0);
    let round = find_round_by_number(&conn, 1).unwrap();
    assert!(round.is_active);
    assert!(round.draw_date.is_none());
    assert_eq!(round_rows::max_round_number(&conn).unwrap(), 1);
    assert_eq!(round_rows::count_active(&conn).unwrap(), 1);

    conn.execute_batch("DROP TRIGGER fail_second_prize;").unwrap();
    let outcome = conduct_draw(&mut conn, None, &mut rng).unwrap();
    assert_eq!(outcome.winners.len(), 3);
}

#[test]
fn registration_after_draw_joins_next_round() {
    let mut conn = open_in_memory().unwrap();
    let p = invest(&conn, 1_000);
    register(&mut conn, p, 1_000, "a@example.com");
    let mut rng = StdRng::seed_from_u64(2);
    conduct_draw(&mut conn, None, &mut rng).unwrap();

    let late = invest(&conn, 4_000);
    let participant = register(&mut conn, late, 4_000, "late@example.com");
    assert_eq!(participant.lottery_round, 2);
    assert_eq!(list_participants(&conn, Some(1)).unwrap().total_participants, 1);
    assert_eq!(list_participants(&conn, None).unwrap().total_tickets, 4);
}

#[test]
fn prizes_can_be_claimed_once() {
    let mut conn = open_in_memory().unwrap();
    let p = invest(&conn, 3_000);
    register(&mut conn, p, 3_000, "a@example.com");
    let mut rng = StdRng::seed_from_u64(4);
    conduct_draw(&mut conn, None, &mut rng).unwrap();

    let claimed = claim_prize(&mut conn, 1, 2).unwrap();
    assert!(claimed.claimed);
    assert!(list_winners(&conn, Some(1)).unwrap().winners[1].claimed);

    let again = claim_prize(&mut conn, 1, 2).unwrap_err();
    assert!(matches!(again, LotteryError::AlreadyClaimed { round: 1, position: 2 }));
    assert!(matches!(
        claim_prize(&mut conn, 1, 4).unwrap_err(),
        LotteryError::InvalidInput(_)
    ));
    assert!(matches!(
        claim_prize(&mut conn, 7, 1).unwrap_err(),
        LotteryError::InvalidInput(_)
    ));
}

#[test]
fn issued_tickets_are_globally_unique() {
    let mut conn = open_in_memory().unwrap();
    let mut all = HashSet::new();
    let issue = |conn: &mut Connection, seed: u64| {
        let p = invest(conn, 25_000);
        let mut rng = StdRng::seed_from_u64(seed);
        register_participant(
            conn,
            &Registration {
                payment_id: Some(p),
                amount: 25_000,
                email: None,
            },
            &mut rng,
        )
        .unwrap()
        .ticket_numbers
    };

    // The repeated seed replays the same candidates, forcing regeneration.
    for seed in [1234, 1234, 1, 2, 3, 4] {
        let tickets = issue(&mut conn, seed);
        assert_eq!(tickets.len(), 25);
        for t in tickets {
            assert!(all.insert(t));
        }
    }
    assert_eq!(all.len(), 150);
}
