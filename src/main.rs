//! Vault Core Simulation.
//!
//! Walks one vault through its lifecycle: liquidity deposits, leveraged longs and
//! shorts, funding accrual, rejected operations and fee withdrawal.

use rust_decimal::Decimal;
use std::error::Error;
use vault_core::price::{to_display, usd_display};
use vault_core::*;

const USDC: AssetId = AssetId(1);
const BTC: AssetId = AssetId(2);

const LP: AccountId = AccountId(1);
const ALICE: AccountId = AccountId(2);
const BOB: AccountId = AccountId(3);
const CAROL: AccountId = AccountId(4);
const DAVE: AccountId = AccountId(5);

const START: u64 = 1_700_000_000;
const HOUR: u64 = 3_600;

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    println!("Vault Core Simulation");
    println!("Two pools, USDC and BTC, full lifecycle\n");

    let mut clock = FixedClock(Timestamp::from_secs(START));
    let mut oracle = OracleSnapshot::new()
        .with_price(USDC, PRICE_PRECISION)
        .with_price(BTC, px(50_000));

    let (mut engine, cap) = Engine::new(VaultId(1), Environment::Development.config())?;
    engine.create_pool(&cap, USDC, PoolConfig::stable("USDC", 6, 50))?;
    engine.create_pool(&cap, BTC, PoolConfig::volatile("BTC", 8, 50))?;

    scenario_1_liquidity(&mut engine, &oracle, clock.unix_seconds())?;
    scenario_2_long(&mut engine, &oracle, clock.unix_seconds())?;
    scenario_3_shorts(&mut engine, &mut oracle, clock.unix_seconds())?;

    clock.advance(8 * HOUR);
    scenario_4_funding(&mut engine, &oracle, clock.unix_seconds())?;
    scenario_5_rejections(&mut engine, &oracle, clock.unix_seconds())?;
    scenario_6_fees(&mut engine, &cap, &oracle)?;

    println!("\nAll simulations completed successfully.");
    Ok(())
}

/// Two deposits, the first mints shares 1:1 with debt units.
fn scenario_1_liquidity(engine: &mut Engine, oracle: &OracleSnapshot, now: Timestamp) -> Result<(), EngineError> {
    println!("Scenario 1: Liquidity Deposits\n");

    let result = engine.add_liquidity(LP, USDC, 100_000 * 1_000_000, 0, 0, oracle, now)?;
    println!("  LP deposits 100,000 USDC");
    println!(
        "  Minted {} debt units, {} shares",
        shares(result.debt_amount),
        shares(result.mint_amount)
    );

    let result = engine.add_liquidity(LP, BTC, 2 * 100_000_000, 0, 0, oracle, now)?;
    println!("  LP deposits 2 BTC at $50,000");
    println!(
        "  AUM before: {} debt units, minted {} shares",
        shares(result.aum_in_debt),
        shares(result.mint_amount)
    );
    println!("  Share price: ${}\n", usd(engine.share_price(oracle)?));
    Ok(())
}

/// New 10x long on BTC collateral.
fn scenario_2_long(engine: &mut Engine, oracle: &OracleSnapshot, now: Timestamp) -> Result<(), EngineError> {
    println!("Scenario 2: Open Long\n");

    let result = engine.increase_position(
        IncreasePositionRequest {
            account: ALICE,
            collateral_asset: BTC,
            index_asset: BTC,
            amount_in: 2_000_000, // 0.02 BTC
            min_out: 0,
            size_delta: 10_000 * USD_PRECISION,
            side: Side::Long,
            limit_price: px(50_100),
        },
        oracle,
        now,
    )?;

    print_position(engine, &result.key)?;
    println!("  Fee paid: ${}, reserved {} BTC\n", usd(result.fee_usd), btc(result.reserve_delta));
    Ok(())
}

/// Two shorts either side of a price rise and the global short average they leave.
fn scenario_3_shorts(engine: &mut Engine, oracle: &mut OracleSnapshot, now: Timestamp) -> Result<(), EngineError> {
    println!("Scenario 3: Short Book\n");

    let request = |account, limit_price| IncreasePositionRequest {
        account,
        collateral_asset: USDC,
        index_asset: BTC,
        amount_in: 1_000 * 1_000_000,
        min_out: 0,
        size_delta: 5_000 * USD_PRECISION,
        side: Side::Short,
        limit_price,
    };

    engine.increase_position(request(BOB, px(49_900)), &*oracle, now)?;
    println!("  Bob shorts $5,000 at $50,000");

    oracle.set_price(BTC, px(52_000));
    engine.increase_position(request(CAROL, px(51_900)), &*oracle, now)?;
    println!("  BTC rises to $52,000, Carol shorts $5,000");

    let pool = engine.pool(BTC)?;
    println!(
        "  Global short size ${}, average ${}",
        usd(pool.global_short_size),
        usd(pool.global_short_average_price)
    );
    println!("  AUM with the short book under water: ${}\n", usd(engine.aum(&*oracle, true)?));

    oracle.set_price(BTC, px(50_000));
    Ok(())
}

/// Eight hours later the long adds size and pays accrued funding.
fn scenario_4_funding(engine: &mut Engine, oracle: &OracleSnapshot, now: Timestamp) -> Result<(), EngineError> {
    println!("Scenario 4: Funding Accrual\n");

    let result = engine.increase_position(
        IncreasePositionRequest {
            account: ALICE,
            collateral_asset: BTC,
            index_asset: BTC,
            amount_in: 200_000, // 0.002 BTC
            min_out: 0,
            size_delta: 1_000 * USD_PRECISION,
            side: Side::Long,
            limit_price: px(50_100),
        },
        oracle,
        now,
    )?;

    let pool = engine.pool(BTC)?;
    println!(
        "  BTC pool utilisation {} bps, cumulative funding rate {}",
        pool.utilization_bps(),
        pool.cumulative_funding_rate
    );
    println!("  Margin plus funding fee: ${}", usd(result.fee_usd));
    print_position(engine, &result.key)?;
    println!();
    Ok(())
}

/// Operations that must abort without touching state.
fn scenario_5_rejections(engine: &mut Engine, oracle: &OracleSnapshot, now: Timestamp) -> Result<(), EngineError> {
    println!("Scenario 5: Rejected Operations\n");

    let events_before = engine.events().len();

    let result = engine.increase_position(
        IncreasePositionRequest {
            account: ALICE,
            collateral_asset: BTC,
            index_asset: BTC,
            amount_in: 1_000_000,
            min_out: 0,
            size_delta: 1_000 * USD_PRECISION,
            side: Side::Long,
            limit_price: px(49_000),
        },
        oracle,
        now,
    );
    print_rejection("Long with a stale limit", result.err());

    let result = engine.increase_position(
        IncreasePositionRequest {
            account: DAVE,
            collateral_asset: USDC,
            index_asset: BTC,
            amount_in: 10 * 1_000_000,
            min_out: 0,
            size_delta: 10_000 * USD_PRECISION,
            side: Side::Short,
            limit_price: px(49_000),
        },
        oracle,
        now,
    );
    print_rejection("Short above max leverage", result.err());

    let result = engine.add_liquidity(LP, USDC, 0, 0, 0, oracle, now);
    print_rejection("Empty deposit", result.err());

    let (_, foreign_cap) = Engine::new(VaultId(2), VaultConfig::default())?;
    let result = engine.set_fees(&foreign_cap, FeeSchedule::default());
    print_rejection("Fee change with another vault's cap", result.err());

    println!("  Events emitted by rejected calls: {}\n", engine.events().len() - events_before);
    Ok(())
}

fn scenario_6_fees(engine: &mut Engine, cap: &AdminCap, oracle: &OracleSnapshot) -> Result<(), EngineError> {
    println!("Scenario 6: Fee Withdrawal\n");

    let usdc_fees = engine.withdraw_fees(cap, USDC)?;
    let btc_fees = engine.withdraw_fees(cap, BTC)?;
    println!("  Withdrew {} USDC and {} BTC", token(usdc_fees, 6), btc(btc_fees));
    println!("  AUM ${}, share price ${}", usd(engine.aum(oracle, true)?), usd(engine.share_price(oracle)?));
    println!("  Event log holds {} events", engine.events().len());
    Ok(())
}

fn print_position(engine: &Engine, key: &PositionKey) -> Result<(), EngineError> {
    let position = engine.position(key).ok_or(EngineError::PositionNotFound(*key))?;
    let leverage = engine.position_leverage(key)?.unwrap_or(0);
    println!(
        "  {} {}: size ${}, collateral ${}, entry ${}, leverage {}x",
        position.owner,
        position.side,
        usd(position.size),
        usd(position.collateral),
        usd(position.average_price),
        token(leverage, 4)
    );
    Ok(())
}

fn print_rejection(label: &str, error: Option<EngineError>) {
    match error {
        Some(e) => println!("  {}: rejected ({})", label, e),
        None => println!("  {}: unexpectedly accepted", label),
    }
}

fn px(v: u128) -> u128 {
    v * PRICE_PRECISION
}

fn usd(v: u128) -> Decimal {
    usd_display(v).unwrap_or_default().round_dp(2)
}

fn btc(v: u128) -> Decimal {
    token(v, 8)
}

fn shares(v: u128) -> Decimal {
    token(v, SHARE_DECIMALS).round_dp(4)
}

fn token(v: u128, decimals: u32) -> Decimal {
    to_display(v, decimals).unwrap_or_default()
}
