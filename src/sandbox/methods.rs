use std::fmt;
use std::str::FromStr;

macro_rules! sandbox_methods {
    ($($variant:ident => $name:literal,)+) => {
        /// Every method that may cross the sandbox channel, in either direction.
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
        pub enum SandboxMethod {
            $($variant,)+
        }

        impl SandboxMethod {
            pub const ALL: &'static [SandboxMethod] = &[$(SandboxMethod::$variant,)+];

            /// Wire name of the method.
            pub fn as_str(self) -> &'static str {
                match self {
                    $(SandboxMethod::$variant => $name,)+
                }
            }
        }

        impl FromStr for SandboxMethod {
            type Err = String;

            fn from_str(name: &str) -> Result<Self, Self::Err> {
                match name {
                    $($name => Ok(SandboxMethod::$variant),)+
                    _ => Err(name.to_string()),
                }
            }
        }
    };
}

sandbox_methods! {
    HeartBeat => "heartBeat",

    // app -> sandbox: engine lifecycle
    Block => "block",
    Unblock => "unblock",
    OnAttach => "onAttach",
    NotifyConfigurationChanged => "notifyConfigurationChanged",
    UpdateLocale => "updateLocale",
    RegisterBundleChunks => "registerBundleChunks",
    RegisterComponents => "registerComponents",
    TerminateExecution => "terminateExecution",
    Shutdown => "shutdown",

    // app -> sandbox: application and page lifecycle
    CreateApplication => "createApplication",
    RequestApplication => "onRequestApplication",
    OnShowApplication => "onShowApplication",
    OnHideApplication => "onHideApplication",
    DestroyApplication => "destroyApplication",
    CreatePage => "createPage",
    RecreatePage => "recreatePage",
    RefreshPage => "refreshPage",
    NotifyPageNotFound => "notifyPageNotFound",
    DestroyPage => "destroyPage",
    BackPressPage => "backPressPage",
    MenuButtonPressPage => "menuButtonPressPage",
    KeyPressPage => "keyPressPage",
    MenuPressPage => "menuPressPage",
    OrientationChangePage => "orientationChangePage",
    ReachPageTop => "reachPageTop",
    ReachPageBottom => "reachPageBottom",
    PageScroll => "pageScroll",
    OnFoldCard => "onFoldCard",
    OnFrameCallback => "onFrameCallback",

    // app -> sandbox: script execution and events
    ExecuteVoidScript => "executeVoidScript",
    ExecuteScript => "executeScript",
    ExecuteVoidFunction => "executeVoidFunction",
    ExecuteObjectScriptAndStringify => "executeObjectScriptAndStringify",
    FireEvent => "fireEvent",
    FireKeyEvent => "fireKeyEvent",
    FireCallback => "fireCallback",

    // app -> sandbox: inspector passthrough
    InspectorHandleMessage => "inspectorHandleMessage",
    InspectorInit => "inspectorInit",
    InspectorSetV8Context => "inspectorSetV8Context",
    InspectorDisposeV8Context => "inspectorDisposeV8Context",
    InspectorDestroy => "inspectorDestroy",
    InspectorBeginLoadJsCode => "inspectorBeginLoadJsCode",
    InspectorEndLoadJsCode => "inspectorEndLoadJsCode",
    InspectorExecuteJsCode => "inspectorExecuteJsCode",
    InspectorFrontendReload => "inspectorFrontendReload",

    // sandbox -> app
    CallNative => "callNative",
    GetViewId => "getViewId",
    ReadDebugAsset => "readDebugAsset",
    OnKeyEventCallback => "onKeyEventCallback",
    InvokeFeature => "invokeFeature",
    RouterBack => "routerBack",
    RouterPush => "routerPush",
    RouterClear => "routerClear",
    RouterReplace => "routerReplace",
    InspectorResponse => "inspectorResponse",
    InspectorSendNotification => "inspectorSendNotification",
    InspectorRunMessageLoopOnPause => "inspectorRunMessageLoopOnPause",
    InspectorQuitMessageLoopOnPause => "inspectorQuitMessageLoopOnPause",
    ProfilerIsEnabled => "profilerIsEnabled",
    ProfilerRecord => "profilerRecord",
    ProfilerSaveProfilerData => "profilerSaveProfilerData",
    ProfilerTimeEnd => "profilerTimeEnd",
    OnV8Exception => "onV8Exception",
    RequestAnimationFrameNative => "requestAnimationFrameNative",
}

impl fmt::Display for SandboxMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn names_are_unique_and_parse_back() {
        let names: HashSet<_> = SandboxMethod::ALL.iter().map(|m| m.as_str()).collect();
        assert_eq!(names.len(), SandboxMethod::ALL.len());
        for method in SandboxMethod::ALL {
            assert_eq!(method.as_str().parse::<SandboxMethod>(), Ok(*method));
        }
        assert_eq!("noSuchMethod".parse::<SandboxMethod>(), Err("noSuchMethod".to_string()));
    }
}
