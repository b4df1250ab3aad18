//! Request quota per client ip

use std::{net::IpAddr, num::NonZeroU32, sync::Arc, time::Duration};

use anyhow::Context;
use axum::{
    extract::{Request, State},
    http::{header, HeaderName, HeaderValue, StatusCode},
    middleware::{from_fn_with_state, Next},
    response::Response,
    Router,
};
use governor::{
    clock::{Clock, DefaultClock},
    middleware::{StateInformationMiddleware, StateSnapshot},
    state::keyed::DefaultKeyedStateStore,
    NotUntil, Quota,
};
use tracing::debug;

use super::client_ip::ClientIp;
use crate::{routes::error, RestServerRateLimitConfig};

/// Number of tracked clients above which idle ones are forgotten.
const RETAIN_THRESHOLD: usize = 1024;

const RATELIMIT_LIMIT: HeaderName = HeaderName::from_static("ratelimit-limit");
const RATELIMIT_REMAINING: HeaderName = HeaderName::from_static("ratelimit-remaining");
const RATELIMIT_RESET: HeaderName = HeaderName::from_static("ratelimit-reset");

pub fn add<S: Clone + Send + Sync + 'static>(
    config: RestServerRateLimitConfig,
) -> anyhow::Result<impl FnOnce(Router<S>) -> Router<S>> {
    let limiter = Arc::new(RateLimiter::new(config, DefaultClock::default())?);
    Ok(move |router: Router<S>| router.layer(from_fn_with_state(limiter, middleware)))
}

async fn middleware(
    State(limiter): State<Arc<RateLimiter<DefaultClock>>>,
    request: Request,
    next: Next,
) -> Response {
    let client_ip = request
        .extensions()
        .get::<ClientIp>()
        .map(|ip| ip.0)
        .unwrap_or(IpAddr::from([0, 0, 0, 0]));

    match limiter.check(client_ip) {
        Decision::Allow { remaining, reset } => {
            let mut response = next.run(request).await;
            let headers = response.headers_mut();
            headers.insert(RATELIMIT_LIMIT, limiter.requests.into());
            headers.insert(RATELIMIT_REMAINING, remaining.into());
            headers.insert(RATELIMIT_RESET, seconds(reset));
            response
        }
        Decision::Deny { retry_after } => {
            debug!(%client_ip, ?retry_after, "rate limit exceeded");
            let mut response = error(StatusCode::TOO_MANY_REQUESTS, "Too many requests");
            let headers = response.headers_mut();
            headers.insert(RATELIMIT_LIMIT, limiter.requests.into());
            headers.insert(RATELIMIT_REMAINING, HeaderValue::from_static("0"));
            headers.insert(RATELIMIT_RESET, seconds(retry_after));
            headers.insert(header::RETRY_AFTER, seconds(retry_after));
            response
        }
    }
}

fn seconds(duration: Duration) -> HeaderValue {
    let secs = duration.as_secs() + u64::from(duration.subsec_nanos() > 0);
    secs.into()
}

type KeyedLimiter<C> = governor::RateLimiter<
    IpAddr,
    DefaultKeyedStateStore<IpAddr>,
    C,
    StateInformationMiddleware,
>;

/// `requests` per `window` for every client, usable as a single burst and
/// replenished evenly over the window.
struct RateLimiter<C: Clock> {
    requests: u32,
    quota: Quota,
    clock: C,
    limiter: KeyedLimiter<C>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Decision {
    Allow { remaining: u32, reset: Duration },
    Deny { retry_after: Duration },
}

impl<C: Clock + Clone> RateLimiter<C> {
    fn new(config: RestServerRateLimitConfig, clock: C) -> anyhow::Result<Self> {
        let burst = NonZeroU32::new(config.requests)
            .context("The rate limit must allow at least one request")?;
        let quota = Quota::with_period(config.window / config.requests)
            .context("The rate limit window must not be empty")?
            .allow_burst(burst);

        let limiter = governor::RateLimiter::<
            IpAddr,
            DefaultKeyedStateStore<IpAddr>,
            C,
            governor::middleware::NoOpMiddleware<C::Instant>,
        >::new(
            quota,
            DefaultKeyedStateStore::default(),
            clock.clone(),
        )
        .with_middleware::<StateInformationMiddleware>();

        Ok(Self {
            requests: config.requests,
            quota,
            clock,
            limiter,
        })
    }

    fn check(&self, client: IpAddr) -> Decision {
        if self.limiter.len() > RETAIN_THRESHOLD {
            self.limiter.retain_recent();
        }

        match self.limiter.check_key(&client) {
            Ok(snapshot) => self.allowed(&snapshot),
            Err(not_until) => self.denied(&not_until),
        }
    }

    fn allowed(&self, snapshot: &StateSnapshot) -> Decision {
        let remaining = snapshot.remaining_burst_capacity();
        Decision::Allow {
            remaining,
            // time until the whole burst is available again
            reset: self.quota.replenish_interval() * (self.requests - remaining),
        }
    }

    fn denied(&self, not_until: &NotUntil<C::Instant>) -> Decision {
        Decision::Deny {
            retry_after: not_until.wait_time_from(self.clock.now()),
        }
    }
}
