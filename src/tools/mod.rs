use std::collections::HashMap;
use std::sync::Arc;

pub mod common;
use self::common::{AsyncFn, Param, with_args};

mod apply_patches;
mod preview_patches;

use crate::patching::Engine;

/// Exposed tools are represented as a map keyed by function name.
pub type ExposedTools = HashMap<&'static str, (&'static str, AsyncFn, Vec<Param>)>;

/// Both phases of the patch engine, sharing one engine instance.
pub fn all_tools(engine: Arc<Engine>) -> ExposedTools {
    macro_rules! collect_tools {
      ($($module:ident),+ $(,)?) => {{
        let mut map: ExposedTools = HashMap::new();
        $({
            let (name, desc, params) = $module::spec();
            let engine = Arc::clone(&engine);
            let call: AsyncFn = with_args::<$module::Args, _, _>(move |args| {
                $module::call(Arc::clone(&engine), args)
            });
            map.insert(name, (desc, call, params));
        })+
        map
      }};
    }

    collect_tools![preview_patches, apply_patches]
}

pub async fn invoke(
    tools: &ExposedTools,
    name: &str,
    args: serde_json::Value,
) -> Result<serde_json::Value, String> {
    let Some((_, work, _)) = tools.get(name) else {
        return Err("No such function".to_string());
    };
    Ok(work(args).await)
}
