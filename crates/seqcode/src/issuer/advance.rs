use core::time::Duration;

use crate::{Calibration, IssuePath, Issued, SharedCache};

/// How often a caller re-seeds a counter that keeps vanishing underneath it
/// before giving up and issuing uncoordinated.
const SEED_ATTEMPTS: usize = 3;

/// Advances the counter at `key`, seeding it from `calibrate` when cold.
///
/// 1. Without a cache, return the calibrated seed (uncoordinated).
/// 2. If the counter is live, increment it.
/// 3. Otherwise seed it with the calibrated value only if still absent. The
///    seeder consumes the seed itself; a caller that lost the seed race goes
///    back to step 2 and increments the winner's counter.
///
/// Step 2 never creates a key, so a counter that expires or is invalidated
/// mid-flight is recalibrated instead of restarting at 1 without a TTL.
///
/// A cache error at any step falls back to step 1. `calibrate` runs at most
/// once and only when the counter is cold.
pub(crate) fn advance(
    cache: Option<&dyn SharedCache>,
    key: &str,
    ttl: Option<Duration>,
    calibrate: impl FnOnce() -> Calibration,
) -> Issued {
    let Some(cache) = cache else {
        return Issued::new(calibrate().seed(), IssuePath::Degraded);
    };

    let mut calibrate = Some(calibrate);
    let mut seed = None;
    for _ in 0..SEED_ATTEMPTS {
        match cache.increment_if_exists(key) {
            Ok(Some(n)) if seed.is_some() => return Issued::new(n, IssuePath::LostSeedRace),
            Ok(Some(n)) => return Issued::new(n, IssuePath::Incremented),
            Ok(None) => {}
            Err(_e) => {
                #[cfg(feature = "tracing")]
                tracing::warn!(%key, "Counter increment failed, issuing uncoordinated: {_e}");
                return Issued::new(seed_of(&mut seed, &mut calibrate), IssuePath::Degraded);
            }
        }

        let value = seed_of(&mut seed, &mut calibrate);
        match cache.set_if_absent(key, value, ttl) {
            Ok(true) => return Issued::new(value, IssuePath::Seeded),
            Ok(false) => {
                #[cfg(feature = "tracing")]
                tracing::debug!(%key, "Lost seed race, incrementing");
            }
            Err(_e) => {
                #[cfg(feature = "tracing")]
                tracing::warn!(%key, "Counter seeding failed, issuing uncoordinated: {_e}");
                return Issued::new(value, IssuePath::Degraded);
            }
        }
    }

    #[cfg(feature = "tracing")]
    tracing::warn!(%key, "Counter kept vanishing while seeding, issuing uncoordinated");
    Issued::new(seed_of(&mut seed, &mut calibrate), IssuePath::Degraded)
}

fn seed_of(seed: &mut Option<u64>, calibrate: &mut Option<impl FnOnce() -> Calibration>) -> u64 {
    *seed.get_or_insert_with(|| calibrate.take().map_or(1, |calibrate| calibrate().seed()))
}

/// Folds a number that outgrew a `width`-digit serial field back into
/// `1..=10^width - 1`.
///
/// The shared counter keeps climbing past the field; every caller maps only
/// the value it drew, so concurrent callers on either side of the boundary
/// still get distinct numbers. The first number of each new lap is reported
/// as [`IssuePath::RolledOver`].
pub(crate) fn wrap(issued: Issued, width: usize) -> Issued {
    let Some(max) = u32::try_from(width)
        .ok()
        .and_then(|width| 10u64.checked_pow(width))
        .map(|limit| limit - 1)
        .filter(|&max| max > 0)
    else {
        return issued;
    };
    if issued.number <= max {
        return issued;
    }

    let number = (issued.number - 1) % max + 1;
    if number == 1 {
        #[cfg(feature = "tracing")]
        tracing::debug!(width, "Counter outgrew its field, rolling over");
        return Issued::new(number, IssuePath::RolledOver);
    }
    Issued::new(number, issued.path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrap_maps_each_draw_independently() {
        let drawn = |n| wrap(Issued::new(n, IssuePath::Incremented), 2);

        assert_eq!(drawn(99), Issued::new(99, IssuePath::Incremented));
        assert_eq!(drawn(100), Issued::new(1, IssuePath::RolledOver));
        assert_eq!(drawn(101), Issued::new(2, IssuePath::Incremented));
        assert_eq!(drawn(198), Issued::new(99, IssuePath::Incremented));
        assert_eq!(drawn(199), Issued::new(1, IssuePath::RolledOver));
    }

    #[test]
    fn wrap_ignores_fields_wider_than_the_counter() {
        let issued = Issued::new(u64::MAX, IssuePath::Incremented);
        assert_eq!(wrap(issued, 20), issued);
        assert_eq!(wrap(issued, usize::MAX), issued);
    }
}
