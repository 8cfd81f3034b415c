//! Small declarative helpers shared by the HTTP apps.

/// Generate a `pub fn routes(cfg: &mut ServiceConfig)` that registers the
/// listed actix-web services and delegates to nested route modules.
///
/// ```ignore
/// macros_utils::routes! {
///     route health_route,
///     load subscription,
/// }
/// ```
#[cfg(feature = "actix")]
#[macro_export]
macro_rules! routes {
    (@register $cfg:ident, route $item:ident) => {
        $cfg.service($item);
    };
    (@register $cfg:ident, load $module:ident) => {
        $cfg.configure($module::routes);
    };
    ($($kind:ident $item:ident),* $(,)?) => {
        pub fn routes(cfg: &mut ::actix_web::web::ServiceConfig) {
            $( $crate::routes!(@register cfg, $kind $item); )*
        }
    };
}
