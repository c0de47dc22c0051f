/// pledge lifecycle - originate, accrue, pay down and close with controlled time
use chrono::{Duration, TimeZone, Utc};
use pledge_ledger_rs::{
    init_tracing, CustomerRequest, LedgerConfig, Money, PaymentRequest, PledgeLedger,
    PledgeRequest, Rate, SafeTimeProvider, TimeSource,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let time = SafeTimeProvider::new(TimeSource::Test(
        Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap(),
    ));
    let controller = time.test_control().unwrap();

    let mut ledger = PledgeLedger::in_memory(LedgerConfig::tiered_rates());

    let customer = ledger.register_customer(
        CustomerRequest {
            name: "Anita Rao".to_string(),
            phone: Some("9876543210".to_string()),
            ..Default::default()
        },
        &time,
    )?;

    // 10,000 against a gold chain at 2% a month
    let mut request = PledgeRequest::new(customer.id, Money::from_major(10_000))
        .with_rate(Rate::from_percentage(2));
    request.title = Some("22k gold chain".to_string());
    let pledge = ledger.create_pledge(request, &time)?;
    println!("pledge {} created on {}", pledge.id, time.now().format("%Y-%m-%d"));

    // inside the first month a full month is charged
    controller.advance(Duration::days(10));
    let view = ledger.get_pledge(pledge.id, &time)?;
    println!("day 10 remaining: {}", view.remaining_amount.unwrap_or(Money::ZERO));

    // beyond 30 days each extra day adds a daily increment
    controller.advance(Duration::days(35));
    let view = ledger.get_pledge(pledge.id, &time)?;
    println!("day 45 remaining: {}", view.remaining_amount.unwrap_or(Money::ZERO));

    // partial payment capitalizes interest first
    let receipt = ledger.apply_payment(
        pledge.id,
        PaymentRequest::new(Money::from_major(4_000), "PARTIAL"),
        &time,
    )?;
    println!(
        "paid {} (interest capitalized {}), principal now {}, status {}",
        receipt.payment.amount,
        receipt.interest_capitalized,
        receipt.pledge.amount.unwrap_or(Money::ZERO),
        receipt.pledge.status
    );

    // settle the rest
    let receipt = ledger.apply_payment(
        pledge.id,
        PaymentRequest::new(receipt.total_amount_due, "FULL"),
        &time,
    )?;
    println!("final status: {}", receipt.pledge.status);

    for event in ledger.take_events() {
        println!("{:?}", event);
    }

    println!("{}", receipt.pledge.to_json()?);

    Ok(())
}
