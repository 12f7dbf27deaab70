//! `folio order check` / `folio order compact`.

use anyhow::{bail, Result};
use folio_db::PgPool;
use folio_order::{contiguity, ContiguityReport};

fn print_report(r: &ContiguityReport) {
    println!("count={}", r.count);
    println!("contiguous={}", r.is_contiguous());
    println!("gaps={:?}", r.gaps);
    println!("duplicates={:?}", r.duplicates);
    println!("out_of_range={:?}", r.out_of_range);
}

pub async fn check(pool: &PgPool, verbose: bool) -> Result<()> {
    let slots = folio_db::load_ordering(pool).await?;
    let report = contiguity(&slots);

    if verbose {
        for s in &slots {
            println!("id={} order={}", s.id, s.order);
        }
    }
    print_report(&report);

    if !report.is_contiguous() {
        bail!("ORDERING_NOT_CONTIGUOUS: run `folio order compact` to repair");
    }
    Ok(())
}

pub async fn compact(pool: &PgPool) -> Result<()> {
    let plan = folio_db::compact_ordering(pool).await?;
    println!("records={} writes={}", plan.ordering.len(), plan.writes.len());
    for w in &plan.writes {
        println!("id={} order={}", w.id, w.order);
    }

    let after = contiguity(&folio_db::load_ordering(pool).await?);
    print_report(&after);
    Ok(())
}
