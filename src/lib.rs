use std::time::Duration;

use serde::Serialize;
use tracing::{info, warn};

use crate::{
    browser::renderer::{FormInteraction, PageRenderer, WaitCondition},
    error::Result,
    form::{
        candidate::Candidate,
        collector::{CollectionReport, collect_fields},
        field_model::fingerprint,
        filler::{FillReport, SubmitOutcome, fill_assignment, submit_form},
        locator::{SubmissionTarget, apply_markup_hints, find_apply_link, locate_form},
        value_mapper::{CandidateValueAssignment, map_candidate_values},
    },
    trace::{
        logger::TraceLogger,
        trace::{Stage, TraceEvent},
    },
};

pub mod browser;
pub mod cli;
pub mod error;
pub mod form;
pub mod logging;
pub mod net;
pub mod platform;
pub mod trace;

/// Wait strategy and bounds for one page visit.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    pub wait_until: WaitCondition,
    pub load_timeout: Duration,
    pub settle_timeout: Duration,
    /// Follow an "Apply" link when the first page has nothing to submit.
    pub follow_apply_link: bool,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            wait_until: WaitCondition::NetworkIdle,
            load_timeout: Duration::from_secs(60),
            settle_timeout: Duration::from_secs(60),
            follow_apply_link: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LoadOutcome {
    Loaded,
    /// The load wait expired; whatever rendered so far is used.
    TimedOut,
}

/// Everything learned from one visit to a posting.
#[derive(Debug, Clone, Serialize)]
pub struct PostingScan {
    /// Page the fields were collected from (after any apply-link hop).
    pub url: String,
    pub load: LoadOutcome,
    pub collection: CollectionReport,
    pub target: SubmissionTarget,
    pub followed_apply_link: Option<String>,
    pub fingerprint: String,
}

/// Navigate, treating an expired load wait as a partial success.
pub fn load_page<R: PageRenderer + ?Sized>(
    renderer: &mut R,
    url: &str,
    options: &ScanOptions,
) -> Result<LoadOutcome> {
    match renderer.navigate(url, options.wait_until, options.load_timeout) {
        Ok(()) => Ok(LoadOutcome::Loaded),
        Err(e) if e.is_timeout() => {
            warn!(%url, "page load timed out; continuing with partial content");
            Ok(LoadOutcome::TimedOut)
        }
        Err(e) => Err(e),
    }
}

/// Visit a posting and discover its fields and submission target.
///
/// Falls back, in order, to the posting's "Apply" link and then to hints
/// scraped from raw markup. Only navigation and engine failures are errors.
pub fn scan_posting<R: PageRenderer + ?Sized>(
    renderer: &mut R,
    url: &str,
    options: &ScanOptions,
    tracer: &TraceLogger,
) -> Result<PostingScan> {
    let mut load = load_page(renderer, url, options)?;
    tracer.log(&TraceEvent::now(Stage::Navigate).with_url(url));

    let mut collection = collect_fields(renderer, options.settle_timeout)?;
    let mut target = locate_form(renderer)?;
    let mut followed_apply_link = None;

    if !target.has_submit_controls() && options.follow_apply_link {
        let here = renderer.current_url()?;
        match find_apply_link(renderer) {
            Ok(Some(link)) if link != here => {
                info!(%link, "no submit controls; following apply link");
                tracer.log(&TraceEvent::now(Stage::FollowApply).with_url(&link));
                load = load_page(renderer, &link, options)?;
                collection = collect_fields(renderer, options.settle_timeout)?;
                target = locate_form(renderer)?;
                followed_apply_link = Some(link);
            }
            Ok(_) => {}
            Err(e) if e.is_transport() => return Err(e),
            Err(e) => warn!(error = %e, "could not look for an apply link"),
        }
    }

    let page_url = renderer.current_url()?;
    if !target.has_submit_controls() {
        let markup = renderer.content()?;
        apply_markup_hints(&mut target, &markup, &page_url);
    }

    let fingerprint = fingerprint(&collection.fields);
    tracer.log(
        &TraceEvent::now(Stage::Collect)
            .with_url(&page_url)
            .with_fields(collection.fields.len(), &fingerprint),
    );
    tracer.log(
        &TraceEvent::now(Stage::Locate)
            .with_url(&target.action_url)
            .with_platform(target.platform)
            .with_detail(format!("{} submit controls", target.submit_controls.len())),
    );

    info!(
        url = %page_url,
        platform = %target.platform,
        fields = collection.fields.len(),
        submit_controls = target.submit_controls.len(),
        "scan complete"
    );

    Ok(PostingScan {
        url: page_url,
        load,
        collection,
        target,
        followed_apply_link,
        fingerprint,
    })
}

/// Outcome of an auto-fill attempt.
#[derive(Debug, Clone, Serialize)]
pub struct FillAttempt {
    pub scan: PostingScan,
    pub assignment: CandidateValueAssignment,
    pub report: FillReport,
    pub submit: Option<SubmitOutcome>,
}

/// Scan a posting, fill it with the candidate's values and optionally
/// submit it.
pub fn fill_posting<R: FormInteraction + ?Sized>(
    renderer: &mut R,
    url: &str,
    candidate: &Candidate,
    options: &ScanOptions,
    submit: bool,
    tracer: &TraceLogger,
) -> Result<FillAttempt> {
    let scan = scan_posting(renderer, url, options, tracer)?;

    let assignment = map_candidate_values(&scan.collection.fields, candidate);
    tracer.log(
        &TraceEvent::now(Stage::Map)
            .with_url(&scan.url)
            .with_detail(format!("{} values assigned", assignment.len())),
    );

    let report = fill_assignment(renderer, &assignment)?;
    tracer.log(
        &TraceEvent::now(Stage::Fill)
            .with_url(&scan.url)
            .with_detail(format!(
                "filled {}, missing {}, failed {}",
                report.filled.len(),
                report.missing.len(),
                report.failed.len()
            )),
    );

    let submit = submit.then(|| {
        let outcome = submit_form(renderer, options.wait_until, options.load_timeout);
        tracer.log(
            &TraceEvent::now(Stage::Submit)
                .with_url(outcome.final_url_or_empty())
                .with_detail(format!("{:?}", outcome)),
        );
        outcome
    });

    Ok(FillAttempt {
        scan,
        assignment,
        report,
        submit,
    })
}
