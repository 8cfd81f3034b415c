mod callback;
mod health;
mod ping;
mod subscription;

use health::{health_route, status_route};
use ping::ping_route;

macros_utils::routes! {
    route health_route,
    route status_route,
    route ping_route,
    load subscription,
    load callback,
}
