use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use gloo_console::error;
use gloo_net::http::{Request, RequestBuilder, Response};
use gloo_timers::callback::Timeout;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::rc::Rc;
use thiserror::Error;
use wasm_bindgen_futures::spawn_local;
use web_sys::{InputEvent, MouseEvent, SubmitEvent};
use yew::prelude::*;

const API_BASE_URL: &str = "http://localhost:8000";

const TOKEN_KEY: &str = "token";
const USERNAME_KEY: &str = "username";

const TOAST_VISIBLE_MS: u32 = 3_000;
const USER_LOOKUP_DEBOUNCE_MS: u32 = 500;
const LOGOUT_REDIRECT_MS: u32 = 1_000;

#[derive(Clone, Copy, PartialEq, Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
enum DebtStatus {
    Pending,
    Active,
    Disputed,
    Paid,
    Archived,
    #[serde(other)]
    Unknown,
}

impl DebtStatus {
    fn label(self) -> &'static str {
        match self {
            DebtStatus::Pending => "pending",
            DebtStatus::Active => "active",
            DebtStatus::Disputed => "disputed",
            DebtStatus::Paid => "paid",
            DebtStatus::Archived => "archived",
            DebtStatus::Unknown => "unknown",
        }
    }
}

#[derive(Clone, PartialEq, Debug, Deserialize)]
struct Debt {
    pub id: String,
    pub amount: f64,
    pub description: String,
    pub status: DebtStatus,
    pub creditor_username: String,
    pub debtor_username: String,
    pub created_at: String,
}

#[derive(Clone, PartialEq, Deserialize)]
struct MyDebts {
    owed_to_me: Vec<Debt>,
    i_owe: Vec<Debt>,
    total_owed_to_me: f64,
    total_i_owe: f64,
}

#[derive(Clone, PartialEq, Deserialize)]
struct Notification {
    id: String,
    title: String,
    message: String,
    read: bool,
    created_at: String,
}

#[derive(Clone, PartialEq, Deserialize)]
struct NotificationFeed {
    notifications: Vec<Notification>,
    unread_count: i64,
}

#[derive(Clone, PartialEq, Deserialize)]
struct Stats {
    total_owed_to_me: f64,
    total_i_owe: f64,
    net_balance: f64,
}

#[derive(Clone, PartialEq, Deserialize)]
struct DebtHistory {
    history: Vec<Debt>,
}

#[derive(Clone, PartialEq, Deserialize)]
struct AuthGrant {
    access_token: String,
    username: String,
}

#[derive(Clone, Copy, PartialEq, Debug)]
enum DebtRole {
    Creditor,
    Debtor,
}

fn debt_role(debt: &Debt, viewer: &str) -> DebtRole {
    if debt.creditor_username == viewer {
        DebtRole::Creditor
    } else {
        DebtRole::Debtor
    }
}

#[derive(Clone, Copy, PartialEq, Debug)]
enum DebtCardAction {
    Accept,
    Dispute,
    MarkPaid,
    Cancel,
}

fn debt_card_actions(role: DebtRole, status: DebtStatus) -> &'static [DebtCardAction] {
    match (role, status) {
        (DebtRole::Debtor, DebtStatus::Pending) => {
            &[DebtCardAction::Accept, DebtCardAction::Dispute]
        }
        (DebtRole::Debtor, DebtStatus::Active) => &[DebtCardAction::MarkPaid],
        (DebtRole::Creditor, DebtStatus::Pending) => &[DebtCardAction::Cancel],
        _ => &[],
    }
}

#[derive(Clone, PartialEq, Debug, Serialize)]
struct NewDebtRequest {
    debtor_username: String,
    amount: f64,
    description: String,
    debt_type: &'static str,
}

fn validate_new_debt(
    debtor_username: &str,
    amount: &str,
    description: &str,
) -> Result<NewDebtRequest, String> {
    let debtor_username = debtor_username.trim().to_string();
    let description = description.trim().to_string();

    if debtor_username.is_empty() || description.is_empty() {
        return Err("Please complete all fields.".to_string());
    }

    let amount = match amount.trim().parse::<f64>() {
        Ok(value) if value.is_finite() && value > 0.0 => value,
        _ => return Err("Amount must be a positive number.".to_string()),
    };

    Ok(NewDebtRequest {
        debtor_username,
        amount,
        description,
        debt_type: "single",
    })
}

fn valid_username(username: &str) -> bool {
    (3..=30).contains(&username.len())
        && username
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

fn valid_pin(pin: &str) -> bool {
    (4..=6).contains(&pin.len()) && pin.chars().all(|c| c.is_ascii_digit())
}

fn storage_get(key: &str) -> Option<String> {
    if let Some(window) = web_sys::window() {
        if let Ok(Some(storage)) = window.local_storage() {
            if let Ok(value) = storage.get_item(key) {
                return value;
            }
        }
    }
    None
}

fn storage_set(key: &str, value: &str) {
    if let Some(window) = web_sys::window() {
        if let Ok(Some(storage)) = window.local_storage() {
            let _ = storage.set_item(key, value);
        }
    }
}

fn storage_remove(key: &str) {
    if let Some(window) = web_sys::window() {
        if let Ok(Some(storage)) = window.local_storage() {
            let _ = storage.remove_item(key);
        }
    }
}

#[derive(Clone, PartialEq, Default)]
struct Session {
    token: Option<String>,
    username: Option<String>,
}

// Single writer for the persisted session: login, logout and 401 handling all
// go through this store, which keeps the in-memory copy and localStorage in sync.
#[derive(Clone, PartialEq)]
struct SessionStore {
    current: Rc<RefCell<Session>>,
}

impl SessionStore {
    fn load() -> Self {
        let session = Session {
            token: storage_get(TOKEN_KEY).filter(|token| !token.is_empty()),
            username: storage_get(USERNAME_KEY),
        };
        SessionStore {
            current: Rc::new(RefCell::new(session)),
        }
    }

    fn has_token(&self) -> bool {
        self.current.borrow().token.is_some()
    }

    fn token(&self) -> Option<String> {
        self.current.borrow().token.clone()
    }

    fn username(&self) -> Option<String> {
        self.current.borrow().username.clone()
    }

    fn sign_in(&self, token: &str, username: &str) {
        storage_set(TOKEN_KEY, token);
        storage_set(USERNAME_KEY, username);
        *self.current.borrow_mut() = Session {
            token: Some(token.to_string()),
            username: Some(username.to_string()),
        };
    }

    fn clear(&self) {
        storage_remove(TOKEN_KEY);
        storage_remove(USERNAME_KEY);
        *self.current.borrow_mut() = Session::default();
    }
}

#[derive(Clone, Copy, PartialEq, Debug)]
enum Route {
    Landing,
    Login,
    Signup,
    Dashboard,
}

impl Route {
    fn from_path(path: &str) -> Route {
        match path {
            "/login" => Route::Login,
            "/signup" => Route::Signup,
            "/dashboard" => Route::Dashboard,
            _ => Route::Landing,
        }
    }

    fn path(self) -> &'static str {
        match self {
            Route::Landing => "/",
            Route::Login => "/login",
            Route::Signup => "/signup",
            Route::Dashboard => "/dashboard",
        }
    }
}

#[derive(Clone, Copy, PartialEq, Debug)]
enum Gate {
    Allow,
    Redirect(Route),
}

fn route_gate(has_token: bool, route: Route) -> Gate {
    if !has_token && route == Route::Dashboard {
        return Gate::Redirect(Route::Login);
    }
    if has_token && matches!(route, Route::Login | Route::Signup) {
        return Gate::Redirect(Route::Dashboard);
    }
    Gate::Allow
}

fn current_path() -> String {
    if let Some(window) = web_sys::window() {
        if let Ok(path) = window.location().pathname() {
            return path;
        }
    }
    "/".to_string()
}

fn redirect_to(route: Route) {
    if let Some(window) = web_sys::window() {
        let _ = window.location().set_href(route.path());
    }
}

#[derive(Clone, Copy, PartialEq, Debug, Error)]
enum ApiError {
    #[error("unauthorized")]
    Unauthorized,
    #[error("network error")]
    Network,
}

#[derive(Clone, PartialEq)]
struct ApiClient {
    session: SessionStore,
}

impl ApiClient {
    fn new(session: SessionStore) -> Self {
        ApiClient { session }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", API_BASE_URL, path)
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        let builder = builder.header("Content-Type", "application/json");
        match self.session.token() {
            Some(token) => builder.header("Authorization", &format!("Bearer {}", token)),
            None => builder,
        }
    }

    // A 401 from any endpoint invalidates the whole session; the response is
    // never handed back to the caller.
    fn handle(&self, sent: Result<Response, gloo_net::Error>) -> Result<Response, ApiError> {
        match sent {
            Ok(resp) if resp.status() == 401 => {
                self.session.clear();
                redirect_to(Route::Login);
                Err(ApiError::Unauthorized)
            }
            Ok(resp) => Ok(resp),
            Err(err) => {
                error!(format!("Request failed: {err}"));
                Err(ApiError::Network)
            }
        }
    }

    async fn get(&self, path: &str) -> Result<Response, ApiError> {
        let builder = self.authorized(Request::get(&self.url(path)));
        self.handle(builder.send().await)
    }

    async fn post<T: Serialize>(&self, path: &str, body: &T) -> Result<Response, ApiError> {
        let builder = self.authorized(Request::post(&self.url(path)));
        let request = match builder.json(body) {
            Ok(request) => request,
            Err(err) => {
                error!(format!("Request failed: {err}"));
                return Err(ApiError::Network);
            }
        };
        self.handle(request.send().await)
    }

    async fn post_empty(&self, path: &str) -> Result<Response, ApiError> {
        let builder = self.authorized(Request::post(&self.url(path)));
        self.handle(builder.send().await)
    }

    async fn delete(&self, path: &str) -> Result<Response, ApiError> {
        let builder = self.authorized(Request::delete(&self.url(path)));
        self.handle(builder.send().await)
    }
}

async fn error_detail(resp: &Response) -> Option<String> {
    let body = resp.json::<serde_json::Value>().await.ok()?;
    body.get("detail")
        .and_then(|detail| detail.as_str())
        .map(|detail| detail.to_string())
}

#[derive(Clone, Copy, PartialEq)]
enum ToastSeverity {
    Success,
    Error,
}

#[derive(Clone, PartialEq)]
struct Toast {
    message: String,
    severity: ToastSeverity,
}

impl Toast {
    fn success(message: impl Into<String>) -> Self {
        Toast {
            message: message.into(),
            severity: ToastSeverity::Success,
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Toast {
            message: message.into(),
            severity: ToastSeverity::Error,
        }
    }
}

#[derive(Clone, Copy, PartialEq)]
enum Tab {
    Owed,
    Owing,
    Notifications,
    History,
}

fn empty_state_copy(tab: Tab) -> (&'static str, &'static str) {
    match tab {
        Tab::Owed => ("No debts owed to you", "Create a new debt to get started"),
        Tab::Owing => ("You're all clear!", "No outstanding debts"),
        Tab::Notifications => ("No notifications", "You're all caught up!"),
        Tab::History => ("No history yet", "Completed debts will appear here"),
    }
}

fn empty_state(tab: Tab) -> Html {
    let (title, hint) = empty_state_copy(tab);
    let icon = match tab {
        Tab::Owed => icon_inbox(),
        Tab::Owing => icon_check_circle(),
        Tab::Notifications => icon_bell_slash(),
        Tab::History => icon_history(),
    };
    html! {
        <div class="flex flex-col items-center justify-center py-16 text-center">
            <div class="p-4 bg-slate-100 rounded-full text-slate-400 mb-4">{ icon }</div>
            <h3 class="text-lg font-bold text-[#173E63]">{ title }</h3>
            <p class="text-sm text-slate-400 mt-1">{ hint }</p>
        </div>
    }
}

fn loading_state() -> Html {
    html! {
        <div class="py-16 text-center text-sm text-slate-400">{"Loading..."}</div>
    }
}

async fn load_debts(
    api: ApiClient,
    debts: UseStateHandle<Option<MyDebts>>,
    on_toast: Callback<Toast>,
) {
    match api.get("/debts/my-debts").await {
        Ok(resp) if resp.ok() => match resp.json::<MyDebts>().await {
            Ok(payload) => debts.set(Some(payload)),
            Err(err) => {
                error!(format!("Error loading debts: {err}"));
                on_toast.emit(Toast::error("Failed to load debts"));
            }
        },
        Ok(resp) => {
            error!(format!("Error loading debts: status {}", resp.status()));
            on_toast.emit(Toast::error("Failed to load debts"));
        }
        Err(ApiError::Unauthorized) => {}
        Err(ApiError::Network) => on_toast.emit(Toast::error("Failed to load debts")),
    }
}

async fn load_notifications(
    api: ApiClient,
    notifications: UseStateHandle<Option<NotificationFeed>>,
) {
    match api.get("/users/notifications").await {
        Ok(resp) if resp.ok() => {
            if let Ok(payload) = resp.json::<NotificationFeed>().await {
                notifications.set(Some(payload));
            }
        }
        Ok(resp) => error!(format!(
            "Error loading notifications: status {}",
            resp.status()
        )),
        Err(_) => error!("Error loading notifications"),
    }
}

async fn load_stats(api: ApiClient, stats: UseStateHandle<Option<Stats>>) {
    match api.get("/users/stats").await {
        Ok(resp) if resp.ok() => {
            if let Ok(payload) = resp.json::<Stats>().await {
                stats.set(Some(payload));
            }
        }
        Ok(resp) => error!(format!("Error loading stats: status {}", resp.status())),
        Err(_) => error!("Error loading stats"),
    }
}

async fn load_history(api: ApiClient, history: UseStateHandle<Option<Vec<Debt>>>) {
    match api.get("/debts/history").await {
        Ok(resp) if resp.ok() => {
            if let Ok(payload) = resp.json::<DebtHistory>().await {
                history.set(Some(payload.history));
            }
        }
        Ok(resp) => error!(format!("Error loading history: status {}", resp.status())),
        Err(_) => error!("Error loading history"),
    }
}

fn status_badge_class(status: DebtStatus) -> &'static str {
    match status {
        DebtStatus::Pending => "bg-amber-100 text-amber-700",
        DebtStatus::Active => "bg-sky-100 text-sky-700",
        DebtStatus::Disputed => "bg-red-100 text-red-700",
        DebtStatus::Paid => "bg-emerald-100 text-emerald-700",
        DebtStatus::Archived => "bg-slate-100 text-slate-500",
        DebtStatus::Unknown => "bg-slate-100 text-slate-500",
    }
}

#[derive(Properties, PartialEq)]
struct DebtCardProps {
    debt: Debt,
    role: DebtRole,
    on_accept: Callback<String>,
    on_dispute: Callback<String>,
    on_mark_paid: Callback<String>,
    on_delete: Callback<String>,
}

#[function_component(DebtCard)]
fn debt_card(props: &DebtCardProps) -> Html {
    let debt = &props.debt;
    let other_user = match props.role {
        DebtRole::Creditor => &debt.debtor_username,
        DebtRole::Debtor => &debt.creditor_username,
    };
    let actions = debt_card_actions(props.role, debt.status);

    html! {
        <div class="bg-white rounded-[10px] p-5 shadow-sm border border-border">
            <div class="flex items-center justify-between">
                <span class="text-xl font-bold text-[#173E63]">{ format_currency(debt.amount) }</span>
                <span class={format!("px-3 py-1 rounded-full text-[10px] font-bold uppercase tracking-wider {}", status_badge_class(debt.status))}>
                    { debt.status.label() }
                </span>
            </div>
            <p class="mt-2 text-sm font-semibold text-foreground">{ &debt.description }</p>
            <div class="mt-3 flex items-center gap-4 text-xs text-slate-400">
                <span class="flex items-center gap-1">{ icon_user() }{ other_user }</span>
                <span class="flex items-center gap-1">{ icon_clock() }{ format_date(&debt.created_at, Utc::now()) }</span>
            </div>
            {
                if actions.is_empty() {
                    html! {}
                } else {
                    html! {
                        <div class="flex gap-2 mt-4">
                            { for actions.iter().map(|action| {
                                let id = debt.id.clone();
                                let (label, class, icon, callback) = match *action {
                                    DebtCardAction::Accept => (
                                        "Accept",
                                        "bg-emerald-600 text-white",
                                        icon_check(),
                                        props.on_accept.clone(),
                                    ),
                                    DebtCardAction::Dispute => (
                                        "Dispute",
                                        "bg-red-600 text-white",
                                        icon_x(),
                                        props.on_dispute.clone(),
                                    ),
                                    DebtCardAction::MarkPaid => (
                                        "Mark as Paid",
                                        "bg-emerald-600 text-white",
                                        icon_check_circle(),
                                        props.on_mark_paid.clone(),
                                    ),
                                    DebtCardAction::Cancel => (
                                        "Cancel",
                                        "bg-red-600 text-white",
                                        icon_trash(),
                                        props.on_delete.clone(),
                                    ),
                                };
                                html! {
                                    <button
                                        class={format!("flex items-center gap-1.5 px-3 py-1.5 rounded-lg text-xs font-bold hover:opacity-90 transition-all {}", class)}
                                        onclick={Callback::from(move |_| callback.emit(id.clone()))}
                                    >
                                        { icon }{ label }
                                    </button>
                                }
                            }) }
                        </div>
                    }
                }
            }
        </div>
    }
}

#[derive(Properties, PartialEq)]
struct StatCardProps {
    title: &'static str,
    value: String,
    #[prop_or_default]
    tone: &'static str,
}

#[function_component(StatCard)]
fn stat_card(props: &StatCardProps) -> Html {
    html! {
        <div class="bg-white p-6 rounded-[10px] shadow-sm border border-border">
            <p class="text-muted-foreground text-[10px] font-bold mb-1 tracking-widest uppercase">{ props.title }</p>
            <h3 class={format!("text-2xl font-bold tracking-tight {}", if props.tone.is_empty() { "text-[#1D617A]" } else { props.tone })}>
                { &props.value }
            </h3>
        </div>
    }
}

#[derive(Properties, PartialEq)]
struct DashboardProps {
    on_toast: Callback<Toast>,
}

#[function_component(DashboardPage)]
fn dashboard_page(props: &DashboardProps) -> Html {
    let api = use_context::<ApiClient>().unwrap_or_else(|| ApiClient::new(SessionStore::load()));

    let debts = use_state(|| None::<MyDebts>);
    let notifications = use_state(|| None::<NotificationFeed>);
    let stats = use_state(|| None::<Stats>);
    let history = use_state(|| None::<Vec<Debt>>);

    let active_tab = use_state(|| Tab::Owed);
    let show_modal = use_state(|| false);

    let form_debtor = use_state(|| "".to_string());
    let form_amount = use_state(|| "".to_string());
    let form_description = use_state(|| "".to_string());
    let form_error = use_state(|| None::<String>);
    let creating = use_state(|| false);

    let user_check = use_state(|| None::<bool>);
    let lookup_timer = use_mut_ref(|| None::<Timeout>);

    // all four loads are dispatched up front and settle independently
    {
        let api = api.clone();
        let debts = debts.clone();
        let notifications = notifications.clone();
        let stats = stats.clone();
        let history = history.clone();
        let on_toast = props.on_toast.clone();

        use_effect_with_deps(
            move |_| {
                spawn_local(load_debts(api.clone(), debts, on_toast));
                spawn_local(load_notifications(api.clone(), notifications));
                spawn_local(load_stats(api.clone(), stats));
                spawn_local(load_history(api, history));
                || ()
            },
            (),
        );
    }

    let on_tab = {
        let active_tab = active_tab.clone();
        Callback::from(move |tab: Tab| active_tab.set(tab))
    };

    let on_open_modal = {
        let show_modal = show_modal.clone();
        Callback::from(move |_| show_modal.set(true))
    };

    let on_close_modal = {
        let show_modal = show_modal.clone();
        let form_debtor = form_debtor.clone();
        let form_amount = form_amount.clone();
        let form_description = form_description.clone();
        let form_error = form_error.clone();
        let user_check = user_check.clone();
        let lookup_timer = lookup_timer.clone();
        Callback::from(move |_| {
            show_modal.set(false);
            form_debtor.set("".to_string());
            form_amount.set("".to_string());
            form_description.set("".to_string());
            form_error.set(None);
            user_check.set(None);
            *lookup_timer.borrow_mut() = None;
        })
    };

    let on_debtor_input = {
        let api = api.clone();
        let form_debtor = form_debtor.clone();
        let user_check = user_check.clone();
        let lookup_timer = lookup_timer.clone();
        Callback::from(move |e: InputEvent| {
            let input: web_sys::HtmlInputElement = e.target_unchecked_into();
            let value = input.value();
            form_debtor.set(value.clone());

            // dropping the previous handle cancels any pending lookup
            *lookup_timer.borrow_mut() = None;

            let candidate = value.trim().to_string();
            if candidate.len() < 3 {
                user_check.set(None);
                return;
            }

            let api = api.clone();
            let user_check = user_check.clone();
            *lookup_timer.borrow_mut() = Some(Timeout::new(USER_LOOKUP_DEBOUNCE_MS, move || {
                spawn_local(async move {
                    match api.get(&format!("/users/search/{}", candidate)).await {
                        Ok(resp) if resp.ok() => user_check.set(Some(true)),
                        Ok(_) => user_check.set(Some(false)),
                        Err(ApiError::Unauthorized) => {}
                        Err(ApiError::Network) => user_check.set(Some(false)),
                    }
                });
            }));
        })
    };

    let on_amount_input = {
        let form_amount = form_amount.clone();
        Callback::from(move |e: InputEvent| {
            let input: web_sys::HtmlInputElement = e.target_unchecked_into();
            form_amount.set(input.value());
        })
    };

    let on_description_input = {
        let form_description = form_description.clone();
        Callback::from(move |e: InputEvent| {
            let input: web_sys::HtmlTextAreaElement = e.target_unchecked_into();
            form_description.set(input.value());
        })
    };

    let on_create = {
        let api = api.clone();
        let debts = debts.clone();
        let show_modal = show_modal.clone();
        let form_debtor = form_debtor.clone();
        let form_amount = form_amount.clone();
        let form_description = form_description.clone();
        let form_error = form_error.clone();
        let creating = creating.clone();
        let user_check = user_check.clone();
        let on_toast = props.on_toast.clone();

        Callback::from(move |e: SubmitEvent| {
            e.prevent_default();

            let request = match validate_new_debt(&form_debtor, &form_amount, &form_description) {
                Ok(request) => request,
                Err(message) => {
                    form_error.set(Some(message));
                    return;
                }
            };

            form_error.set(None);
            creating.set(true);

            let api = api.clone();
            let debts = debts.clone();
            let show_modal = show_modal.clone();
            let form_debtor = form_debtor.clone();
            let form_amount = form_amount.clone();
            let form_description = form_description.clone();
            let creating = creating.clone();
            let user_check = user_check.clone();
            let on_toast = on_toast.clone();

            spawn_local(async move {
                match api.post("/debts/create", &request).await {
                    Ok(resp) if resp.ok() => {
                        on_toast.emit(Toast::success("Debt created! Waiting for acceptance..."));
                        show_modal.set(false);
                        form_debtor.set("".to_string());
                        form_amount.set("".to_string());
                        form_description.set("".to_string());
                        user_check.set(None);
                        load_debts(api.clone(), debts, on_toast).await;
                    }
                    Ok(resp) => {
                        let message = error_detail(&resp)
                            .await
                            .unwrap_or_else(|| "Failed to create debt".to_string());
                        on_toast.emit(Toast::error(message));
                    }
                    Err(ApiError::Unauthorized) => {}
                    Err(ApiError::Network) => {
                        on_toast.emit(Toast::error("Network error. Please try again."));
                    }
                }
                creating.set(false);
            });
        })
    };

    let on_accept = {
        let api = api.clone();
        let debts = debts.clone();
        let stats = stats.clone();
        let on_toast = props.on_toast.clone();
        Callback::from(move |debt_id: String| {
            let api = api.clone();
            let debts = debts.clone();
            let stats = stats.clone();
            let on_toast = on_toast.clone();
            spawn_local(async move {
                let body = serde_json::json!({ "action": "accept" });
                match api.post(&format!("/debts/{}/action", debt_id), &body).await {
                    Ok(resp) if resp.ok() => {
                        on_toast.emit(Toast::success("Debt accepted"));
                        load_debts(api.clone(), debts, on_toast).await;
                        load_stats(api, stats).await;
                    }
                    Ok(resp) => {
                        let message = error_detail(&resp)
                            .await
                            .unwrap_or_else(|| "Failed to accept debt".to_string());
                        on_toast.emit(Toast::error(message));
                    }
                    Err(ApiError::Unauthorized) => {}
                    Err(ApiError::Network) => on_toast.emit(Toast::error("Network error")),
                }
            });
        })
    };

    let on_dispute = {
        let api = api.clone();
        let debts = debts.clone();
        let on_toast = props.on_toast.clone();
        Callback::from(move |debt_id: String| {
            let reason = web_sys::window()
                .and_then(|window| {
                    window
                        .prompt_with_message("Why are you disputing this debt?")
                        .ok()
                })
                .flatten()
                .filter(|reason| !reason.is_empty());
            let reason = match reason {
                Some(reason) => reason,
                None => return,
            };

            let api = api.clone();
            let debts = debts.clone();
            let on_toast = on_toast.clone();
            spawn_local(async move {
                let body = serde_json::json!({ "action": "dispute", "reason": reason });
                match api.post(&format!("/debts/{}/action", debt_id), &body).await {
                    Ok(resp) if resp.ok() => {
                        on_toast.emit(Toast::success("Debt disputed"));
                        load_debts(api, debts, on_toast).await;
                    }
                    Ok(resp) => {
                        let message = error_detail(&resp)
                            .await
                            .unwrap_or_else(|| "Failed to dispute debt".to_string());
                        on_toast.emit(Toast::error(message));
                    }
                    Err(ApiError::Unauthorized) => {}
                    Err(ApiError::Network) => on_toast.emit(Toast::error("Network error")),
                }
            });
        })
    };

    let on_mark_paid = {
        let api = api.clone();
        let debts = debts.clone();
        let stats = stats.clone();
        let on_toast = props.on_toast.clone();
        Callback::from(move |debt_id: String| {
            let confirmed = web_sys::window()
                .map(|window| {
                    window
                        .confirm_with_message("Mark this debt as paid?")
                        .unwrap_or(false)
                })
                .unwrap_or(false);
            if !confirmed {
                return;
            }

            let api = api.clone();
            let debts = debts.clone();
            let stats = stats.clone();
            let on_toast = on_toast.clone();
            spawn_local(async move {
                let body = serde_json::json!({ "action": "mark_paid" });
                match api.post(&format!("/debts/{}/action", debt_id), &body).await {
                    Ok(resp) if resp.ok() => {
                        on_toast.emit(Toast::success("Debt marked as paid!"));
                        load_debts(api.clone(), debts, on_toast).await;
                        load_stats(api, stats).await;
                    }
                    Ok(resp) => {
                        let message = error_detail(&resp)
                            .await
                            .unwrap_or_else(|| "Failed to mark as paid".to_string());
                        on_toast.emit(Toast::error(message));
                    }
                    Err(ApiError::Unauthorized) => {}
                    Err(ApiError::Network) => on_toast.emit(Toast::error("Network error")),
                }
            });
        })
    };

    let on_delete = {
        let api = api.clone();
        let debts = debts.clone();
        let on_toast = props.on_toast.clone();
        Callback::from(move |debt_id: String| {
            let confirmed = web_sys::window()
                .map(|window| {
                    window
                        .confirm_with_message("Cancel this debt request?")
                        .unwrap_or(false)
                })
                .unwrap_or(false);
            if !confirmed {
                return;
            }

            let api = api.clone();
            let debts = debts.clone();
            let on_toast = on_toast.clone();
            spawn_local(async move {
                match api.delete(&format!("/debts/{}", debt_id)).await {
                    Ok(resp) if resp.ok() => {
                        on_toast.emit(Toast::success("Debt cancelled"));
                        load_debts(api, debts, on_toast).await;
                    }
                    Ok(resp) => {
                        let message = error_detail(&resp)
                            .await
                            .unwrap_or_else(|| "Failed to delete debt".to_string());
                        on_toast.emit(Toast::error(message));
                    }
                    Err(ApiError::Unauthorized) => {}
                    Err(ApiError::Network) => on_toast.emit(Toast::error("Network error")),
                }
            });
        })
    };

    let on_notification_read = {
        let api = api.clone();
        let notifications = notifications.clone();
        Callback::from(move |notif_id: String| {
            let api = api.clone();
            let notifications = notifications.clone();
            spawn_local(async move {
                match api
                    .post_empty(&format!("/users/notifications/{}/read", notif_id))
                    .await
                {
                    Ok(_) => load_notifications(api, notifications).await,
                    Err(_) => error!("Error marking notification as read"),
                }
            });
        })
    };

    let on_logout = {
        let api = api.clone();
        let on_toast = props.on_toast.clone();
        Callback::from(move |_| {
            let api = api.clone();
            let on_toast = on_toast.clone();
            spawn_local(async move {
                match api.post_empty("/auth/logout").await {
                    Ok(_) => {
                        api.session.clear();
                        on_toast.emit(Toast::success("Logged out successfully"));
                        Timeout::new(LOGOUT_REDIRECT_MS, || redirect_to(Route::Landing)).forget();
                    }
                    Err(_) => {
                        api.session.clear();
                        redirect_to(Route::Landing);
                    }
                }
            });
        })
    };

    let viewer = api.session.username().unwrap_or_default();
    let unread = (*notifications)
        .as_ref()
        .map(|feed| feed.unread_count)
        .unwrap_or(0);

    let total_owed_to_me = (*debts)
        .as_ref()
        .map(|payload| payload.total_owed_to_me)
        .or_else(|| (*stats).as_ref().map(|payload| payload.total_owed_to_me))
        .unwrap_or(0.0);
    let total_i_owe = (*debts)
        .as_ref()
        .map(|payload| payload.total_i_owe)
        .or_else(|| (*stats).as_ref().map(|payload| payload.total_i_owe))
        .unwrap_or(0.0);
    let net_balance = (*stats)
        .as_ref()
        .map(|payload| payload.net_balance)
        .unwrap_or(0.0);
    let net_tone = if net_balance > 0.0 {
        "text-emerald-600"
    } else if net_balance < 0.0 {
        "text-red-600"
    } else {
        ""
    };

    let tab_button = |tab: Tab, label: &'static str| {
        let is_active = *active_tab == tab;
        let class = if is_active {
            "px-4 py-2 rounded-xl text-[13px] font-bold bg-[#173E63] text-white transition-all"
        } else {
            "px-4 py-2 rounded-xl text-[13px] font-bold text-slate-500 hover:bg-slate-100 transition-all"
        };
        let on_tab = on_tab.clone();
        html! {
            <button type="button" class={class} onclick={Callback::from(move |_| on_tab.emit(tab))}>
                <span class="flex items-center gap-2">
                    { label }
                    {
                        if tab == Tab::Notifications && unread > 0 {
                            html! {
                                <span class="bg-red-500 text-white text-[10px] font-bold px-1.5 py-0.5 rounded-full">
                                    { unread }
                                </span>
                            }
                        } else {
                            html! {}
                        }
                    }
                </span>
            </button>
        }
    };

    let debt_list = |list: &[Debt], role_of: &dyn Fn(&Debt) -> DebtRole| -> Html {
        html! {
            <div class="grid grid-cols-1 md:grid-cols-2 gap-4">
                { for list.iter().map(|debt| html! {
                    <DebtCard
                        key={debt.id.clone()}
                        debt={debt.clone()}
                        role={role_of(debt)}
                        on_accept={on_accept.clone()}
                        on_dispute={on_dispute.clone()}
                        on_mark_paid={on_mark_paid.clone()}
                        on_delete={on_delete.clone()}
                    />
                }) }
            </div>
        }
    };

    let pane = match *active_tab {
        Tab::Owed => match (*debts).as_ref() {
            None => loading_state(),
            Some(payload) if payload.owed_to_me.is_empty() => empty_state(Tab::Owed),
            Some(payload) => debt_list(&payload.owed_to_me, &|_: &Debt| DebtRole::Creditor),
        },
        Tab::Owing => match (*debts).as_ref() {
            None => loading_state(),
            Some(payload) if payload.i_owe.is_empty() => empty_state(Tab::Owing),
            Some(payload) => debt_list(&payload.i_owe, &|_: &Debt| DebtRole::Debtor),
        },
        Tab::Notifications => match (*notifications).as_ref() {
            None => loading_state(),
            Some(feed) if feed.notifications.is_empty() => empty_state(Tab::Notifications),
            Some(feed) => html! {
                <div class="space-y-3">
                    { for feed.notifications.iter().map(|notif| {
                        let id = notif.id.clone();
                        let on_read = on_notification_read.clone();
                        let card_class = if notif.read {
                            "bg-white rounded-[10px] p-4 border border-border cursor-pointer hover:bg-slate-50"
                        } else {
                            "bg-white rounded-[10px] p-4 border border-border border-l-4 border-l-[#173E63] cursor-pointer hover:bg-slate-50"
                        };
                        html! {
                            <div key={notif.id.clone()} class={card_class} onclick={Callback::from(move |_| on_read.emit(id.clone()))}>
                                <div class="flex items-center justify-between">
                                    <strong class="text-sm text-[#173E63]">{ &notif.title }</strong>
                                    {
                                        if notif.read {
                                            html! {}
                                        } else {
                                            html! {
                                                <span class="bg-amber-100 text-amber-700 px-2 py-0.5 rounded-full text-[10px] font-bold uppercase">
                                                    {"New"}
                                                </span>
                                            }
                                        }
                                    }
                                </div>
                                <p class="text-sm text-slate-500 mt-1">{ &notif.message }</p>
                                <div class="mt-2 flex items-center gap-1 text-xs text-slate-400">
                                    { icon_clock() }{ format_date(&notif.created_at, Utc::now()) }
                                </div>
                            </div>
                        }
                    }) }
                </div>
            },
        },
        Tab::History => match (*history).as_ref() {
            None => loading_state(),
            Some(list) if list.is_empty() => empty_state(Tab::History),
            Some(list) => debt_list(list, &|debt: &Debt| debt_role(debt, &viewer)),
        },
    };

    html! {
        <div class="min-h-screen bg-background">
            <header class="bg-[#D8E1E8] border-b border-border h-16 flex items-center justify-between px-6">
                <span class="text-[#173E63] text-xl font-black tracking-tight">{"OweBro"}</span>
                <div class="flex items-center gap-4">
                    <span class="relative text-slate-500">
                        { icon_bell() }
                        {
                            if unread > 0 {
                                html! {
                                    <span class="absolute -top-2 -right-2 bg-red-500 text-white text-[10px] font-bold px-1.5 rounded-full">
                                        { unread }
                                    </span>
                                }
                            } else {
                                html! {}
                            }
                        }
                    </span>
                    <span class="text-sm font-bold text-[#173E63]">{ viewer.clone() }</span>
                    <button
                        onclick={on_logout}
                        class="flex items-center gap-2 px-3 py-1.5 rounded-lg text-[13px] font-medium text-slate-500 hover:bg-white/40 transition-colors"
                    >
                        { icon_log_out() }{"Log Out"}
                    </button>
                </div>
            </header>

            <main class="p-6 max-w-5xl mx-auto space-y-6">
                <div class="flex items-center justify-between">
                    <h1 class="text-2xl font-bold text-foreground">{"Dashboard"}</h1>
                    <button
                        onclick={on_open_modal}
                        class="flex items-center gap-2 bg-[#173E63] text-white px-4 py-2 rounded-xl font-bold text-sm hover:opacity-90 transition-all"
                    >
                        { icon_plus() }{"New Debt"}
                    </button>
                </div>

                <div class="grid grid-cols-1 md:grid-cols-3 gap-6">
                    <StatCard title="Owed To Me" value={format_currency(total_owed_to_me)} />
                    <StatCard title="I Owe" value={format_currency(total_i_owe)} />
                    <StatCard title="Net Balance" value={format_currency(net_balance.abs())} tone={net_tone} />
                </div>

                <div class="flex gap-2 border-b border-border pb-3">
                    { tab_button(Tab::Owed, "Owed to Me") }
                    { tab_button(Tab::Owing, "I Owe") }
                    { tab_button(Tab::Notifications, "Notifications") }
                    { tab_button(Tab::History, "History") }
                </div>

                { pane }
            </main>

            {
                if *show_modal {
                    html! {
                        <div
                            class="fixed inset-0 bg-black/40 flex items-center justify-center z-40"
                            onclick={on_close_modal.clone()}
                        >
                            <div
                                class="bg-white w-full max-w-md rounded-2xl shadow-lg p-6"
                                onclick={Callback::from(|e: MouseEvent| e.stop_propagation())}
                            >
                                <h3 class="text-lg font-bold text-[#173E63] mb-4">{"New Debt"}</h3>
                                <form class="space-y-4" onsubmit={on_create}>
                                    <div class="space-y-1">
                                        <label class="text-[12px] font-bold text-muted-foreground">{"Who owes you?"}</label>
                                        <input
                                            type="text"
                                            placeholder="Username"
                                            value={(*form_debtor).clone()}
                                            oninput={on_debtor_input}
                                            class="w-full bg-[#f1f4f9] rounded-[10px] px-3 py-2 text-sm text-[#173E63] border-none"
                                        />
                                        {
                                            match *user_check {
                                                Some(true) => html! { <p class="text-xs text-emerald-600">{"✓ User found"}</p> },
                                                Some(false) => html! { <p class="text-xs text-red-500">{"✗ User not found"}</p> },
                                                None => html! {},
                                            }
                                        }
                                    </div>
                                    <div class="space-y-1">
                                        <label class="text-[12px] font-bold text-muted-foreground">{"Amount ($)"}</label>
                                        <input
                                            type="number"
                                            step="0.01"
                                            placeholder="0.00"
                                            value={(*form_amount).clone()}
                                            oninput={on_amount_input}
                                            class="w-full bg-[#f1f4f9] rounded-[10px] px-3 py-2 text-sm text-[#173E63] border-none"
                                        />
                                    </div>
                                    <div class="space-y-1">
                                        <label class="text-[12px] font-bold text-muted-foreground">{"What for?"}</label>
                                        <textarea
                                            placeholder="e.g. Dinner last Friday"
                                            value={(*form_description).clone()}
                                            oninput={on_description_input}
                                            class="w-full bg-[#f1f4f9] rounded-[10px] px-3 py-2 text-sm text-[#173E63] border-none"
                                        />
                                    </div>
                                    {
                                        if let Some(message) = &*form_error {
                                            html! { <p class="text-sm text-red-500">{ message.clone() }</p> }
                                        } else {
                                            html! {}
                                        }
                                    }
                                    <div class="flex gap-3 pt-2">
                                        <button
                                            type="button"
                                            onclick={on_close_modal}
                                            class="flex-1 bg-[#D8E1E8] text-[#173E63] py-2 rounded-[10px] text-sm font-bold"
                                        >
                                            {"Cancel"}
                                        </button>
                                        <button
                                            type="submit"
                                            disabled={*creating}
                                            class="flex-1 bg-[#173E63] text-white py-2 rounded-[10px] text-sm font-bold flex items-center justify-center gap-2"
                                        >
                                            { if *creating { "Creating..." } else { "Create Debt" } }
                                        </button>
                                    </div>
                                </form>
                            </div>
                        </div>
                    }
                } else {
                    html! {}
                }
            }
        </div>
    }
}

#[derive(Clone, Copy, PartialEq)]
enum AuthMode {
    Login,
    Signup,
}

#[derive(Properties, PartialEq)]
struct AuthPageProps {
    mode: AuthMode,
}

#[function_component(AuthPage)]
fn auth_page(props: &AuthPageProps) -> Html {
    let api = use_context::<ApiClient>().unwrap_or_else(|| ApiClient::new(SessionStore::load()));

    let mode = use_state(|| props.mode);
    let username = use_state(|| "".to_string());
    let pin = use_state(|| "".to_string());
    let email = use_state(|| "".to_string());
    let full_name = use_state(|| "".to_string());
    let error_msg = use_state(|| None::<String>);
    let submitting = use_state(|| false);

    let on_submit = {
        let api = api.clone();
        let mode = mode.clone();
        let username = username.clone();
        let pin = pin.clone();
        let email = email.clone();
        let full_name = full_name.clone();
        let error_msg = error_msg.clone();
        let submitting = submitting.clone();

        Callback::from(move |e: SubmitEvent| {
            e.prevent_default();

            let username_val = username.trim().to_string();
            let pin_val = (*pin).clone();
            let email_val = email.trim().to_string();
            let full_name_val = full_name.trim().to_string();
            let is_signup = *mode == AuthMode::Signup;

            if is_signup {
                if username_val.is_empty() || pin_val.is_empty() || email_val.is_empty() {
                    error_msg.set(Some("Please complete all fields.".to_string()));
                    return;
                }
                if !valid_username(&username_val) {
                    error_msg.set(Some(
                        "Username must be 3-30 characters (letters, numbers, _ or -).".to_string(),
                    ));
                    return;
                }
                if !valid_pin(&pin_val) {
                    error_msg.set(Some("PIN must be 4-6 digits.".to_string()));
                    return;
                }
            } else if username_val.is_empty() || pin_val.is_empty() {
                error_msg.set(Some("Username and PIN are required".to_string()));
                return;
            }

            error_msg.set(None);
            submitting.set(true);

            let api = api.clone();
            let error_msg = error_msg.clone();
            let submitting = submitting.clone();

            spawn_local(async move {
                let (endpoint, body, fallback) = if is_signup {
                    (
                        "/auth/signup",
                        serde_json::json!({
                            "username": username_val,
                            "email": email_val,
                            "pin": pin_val,
                            "full_name": full_name_val,
                        }),
                        "Signup failed",
                    )
                } else {
                    (
                        "/auth/login",
                        serde_json::json!({ "username": username_val, "pin": pin_val }),
                        "Invalid username or PIN",
                    )
                };

                // deliberately not routed through ApiClient: a 401 here is a
                // wrong PIN, not an expired session
                let builder = Request::post(&format!("{}{}", API_BASE_URL, endpoint))
                    .header("Content-Type", "application/json");
                let request = match builder.json(&body) {
                    Ok(request) => request,
                    Err(_) => {
                        error_msg.set(Some("Network error".to_string()));
                        submitting.set(false);
                        return;
                    }
                };

                match request.send().await {
                    Ok(resp) if resp.ok() => match resp.json::<AuthGrant>().await {
                        Ok(grant) => {
                            api.session.sign_in(&grant.access_token, &grant.username);
                            redirect_to(Route::Dashboard);
                        }
                        Err(_) => {
                            error_msg.set(Some("Unexpected response from server".to_string()));
                        }
                    },
                    Ok(resp) => {
                        let message = error_detail(&resp)
                            .await
                            .unwrap_or_else(|| fallback.to_string());
                        error_msg.set(Some(message));
                    }
                    Err(_) => {
                        error_msg.set(Some("Network error".to_string()));
                    }
                }
                submitting.set(false);
            });
        })
    };

    let toggle_mode = {
        let mode = mode.clone();
        let error_msg = error_msg.clone();
        Callback::from(move |_| {
            mode.set(match *mode {
                AuthMode::Login => AuthMode::Signup,
                AuthMode::Signup => AuthMode::Login,
            });
            error_msg.set(None);
        })
    };

    let is_login = *mode == AuthMode::Login;

    html! {
        <div class="min-h-screen flex items-center justify-center bg-background">
            <div class="w-full max-w-md bg-white border border-border rounded-2xl shadow-lg p-8">
                <div class="text-center mb-6">
                    <h1 class="text-2xl font-bold text-[#173E63]">
                        { if is_login { "Welcome back" } else { "Create account" } }
                    </h1>
                    <p class="text-sm text-slate-500 mt-2">
                        { if is_login { "Sign in to settle up." } else { "Start tracking who owes what." } }
                    </p>
                </div>

                <form class="space-y-4" onsubmit={on_submit}>
                    if !is_login {
                        <div class="space-y-1">
                            <label class="text-sm font-medium text-foreground">{"Full Name"}</label>
                            <input
                                type="text"
                                class="w-full px-4 py-2 bg-[#f1f4f9] border-none rounded-lg text-[#173E63]"
                                value={(*full_name).clone()}
                                oninput={{
                                    let full_name = full_name.clone();
                                    Callback::from(move |e: InputEvent| {
                                        let input: web_sys::HtmlInputElement = e.target_unchecked_into();
                                        full_name.set(input.value());
                                    })
                                }}
                            />
                        </div>
                    }
                    <div class="space-y-1">
                        <label class="text-sm font-medium text-foreground">{"Username"}</label>
                        <input
                            type="text"
                            class="w-full px-4 py-2 bg-[#f1f4f9] border-none rounded-lg text-[#173E63]"
                            value={(*username).clone()}
                            oninput={{
                                let username = username.clone();
                                Callback::from(move |e: InputEvent| {
                                    let input: web_sys::HtmlInputElement = e.target_unchecked_into();
                                    username.set(input.value());
                                })
                            }}
                        />
                    </div>
                    if !is_login {
                        <div class="space-y-1">
                            <label class="text-sm font-medium text-foreground">{"Email"}</label>
                            <input
                                type="email"
                                class="w-full px-4 py-2 bg-[#f1f4f9] border-none rounded-lg text-[#173E63]"
                                value={(*email).clone()}
                                oninput={{
                                    let email = email.clone();
                                    Callback::from(move |e: InputEvent| {
                                        let input: web_sys::HtmlInputElement = e.target_unchecked_into();
                                        email.set(input.value());
                                    })
                                }}
                            />
                        </div>
                    }
                    <div class="space-y-1">
                        <label class="text-sm font-medium text-foreground">{"PIN"}</label>
                        <input
                            type="password"
                            inputmode="numeric"
                            class="w-full px-4 py-2 bg-[#f1f4f9] border-none rounded-lg text-[#173E63]"
                            value={(*pin).clone()}
                            oninput={{
                                let pin = pin.clone();
                                Callback::from(move |e: InputEvent| {
                                    let input: web_sys::HtmlInputElement = e.target_unchecked_into();
                                    pin.set(input.value());
                                })
                            }}
                        />
                    </div>

                    if let Some(message) = &*error_msg {
                        <div class="text-sm text-red-500">{ message.clone() }</div>
                    }

                    <button
                        type="submit"
                        class="w-full bg-[#173E63] text-white py-2 rounded-lg font-semibold hover:opacity-90 transition-opacity"
                        disabled={*submitting}
                    >
                        { if *submitting { "Please wait..." } else if is_login { "Login" } else { "Sign up" } }
                    </button>
                </form>

                <div class="mt-6 text-center text-sm text-slate-500">
                    { if is_login { "No account?" } else { "Already have an account?" } }
                    <button class="ml-2 text-[#1D617A] font-semibold" onclick={toggle_mode}>
                        { if is_login { "Sign up" } else { "Login" } }
                    </button>
                </div>
            </div>
        </div>
    }
}

#[function_component(LandingPage)]
fn landing_page() -> Html {
    html! {
        <div class="min-h-screen flex items-center justify-center bg-background">
            <div class="text-center max-w-lg px-6">
                <h1 class="text-4xl font-black text-[#173E63] tracking-tight">{"OweBro"}</h1>
                <p class="mt-4 text-slate-500">
                    {"Track who owes you and who you owe. No spreadsheets, no awkward reminders."}
                </p>
                <div class="mt-8 flex items-center justify-center gap-3">
                    <a href="/login" class="bg-[#173E63] text-white px-6 py-2.5 rounded-xl font-bold text-sm hover:opacity-90 transition-all">
                        {"Login"}
                    </a>
                    <a href="/signup" class="bg-[#D8E1E8] text-[#173E63] px-6 py-2.5 rounded-xl font-bold text-sm hover:opacity-90 transition-all">
                        {"Sign up"}
                    </a>
                </div>
            </div>
        </div>
    }
}

#[derive(Properties, PartialEq)]
struct ToastHostProps {
    toast: Option<Toast>,
}

#[function_component(ToastHost)]
fn toast_host(props: &ToastHostProps) -> Html {
    match &props.toast {
        Some(toast) => {
            let tone = match toast.severity {
                ToastSeverity::Success => "bg-emerald-600",
                ToastSeverity::Error => "bg-red-600",
            };
            html! {
                <div class={format!("fixed bottom-6 right-6 text-white text-sm font-semibold px-4 py-3 rounded-xl shadow-lg z-50 {}", tone)}>
                    { toast.message.clone() }
                </div>
            }
        }
        None => html! {},
    }
}

fn format_currency(amount: f64) -> String {
    format!("${:.2}", amount)
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    // timestamps without an offset come through as naive UTC
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| Utc.from_utc_datetime(&naive))
}

fn format_date(raw: &str, now: DateTime<Utc>) -> String {
    let date = match parse_timestamp(raw) {
        Some(date) => date,
        None => return raw.to_string(),
    };
    let days = (now - date).num_days();

    if days == 0 {
        "Today".to_string()
    } else if days == 1 {
        "Yesterday".to_string()
    } else if days < 7 {
        format!("{} days ago", days)
    } else if days < 30 {
        format!("{} weeks ago", days / 7)
    } else if days < 365 {
        format!("{} months ago", days / 30)
    } else {
        date.format("%b %d, %Y").to_string()
    }
}

#[function_component(App)]
fn app() -> Html {
    let api = use_state(|| ApiClient::new(SessionStore::load()));
    let toast = use_state(|| None::<Toast>);

    let show_toast = {
        let toast = toast.clone();
        Callback::from(move |next: Toast| {
            toast.set(Some(next));
            let toast = toast.clone();
            // timers are never cancelled: a toast shown while one is pending
            // inherits the earlier hide deadline
            Timeout::new(TOAST_VISIBLE_MS, move || toast.set(None)).forget();
        })
    };

    let route = Route::from_path(&current_path());
    match route_gate(api.session.has_token(), route) {
        Gate::Redirect(target) => {
            redirect_to(target);
            return html! {};
        }
        Gate::Allow => {}
    }

    let view = match route {
        Route::Landing => html! { <LandingPage /> },
        Route::Login => html! { <AuthPage mode={AuthMode::Login} /> },
        Route::Signup => html! { <AuthPage mode={AuthMode::Signup} /> },
        Route::Dashboard => html! { <DashboardPage on_toast={show_toast} /> },
    };

    html! {
        <ContextProvider<ApiClient> context={(*api).clone()}>
            { view }
            <ToastHost toast={(*toast).clone()} />
        </ContextProvider<ApiClient>>
    }
}

fn icon_base(path: &'static str) -> Html {
    html! {
        <svg width="16" height="16" viewBox="0 0 24 24" fill="none" stroke="currentColor" stroke-width="2" stroke-linecap="round" stroke-linejoin="round">
            <path d={path}></path>
        </svg>
    }
}

fn icon_bell() -> Html {
    icon_base("M18 8a6 6 0 10-12 0c0 7-3 7-3 7h18s-3 0-3-7")
}
fn icon_bell_slash() -> Html {
    icon_base("M13.73 21a2 2 0 01-3.46 0M18.63 13A17.89 17.89 0 0118 8M6.26 6.26A5.86 5.86 0 006 8c0 7-3 7-3 7h14M18 8a6 6 0 00-9.33-5M1 1l22 22")
}
fn icon_user() -> Html {
    icon_base("M20 21v-2a4 4 0 00-4-4H8a4 4 0 00-4 4v2M16 7a4 4 0 11-8 0 4 4 0 018 0")
}
fn icon_clock() -> Html {
    icon_base("M12 12m-9 0a9 9 0 1018 0 9 9 0 10-18 0M12 7v5l3 3")
}
fn icon_check() -> Html {
    icon_base("M20 6L9 17l-5-5")
}
fn icon_check_circle() -> Html {
    icon_base("M22 11.08V12a10 10 0 11-5.93-9.14M22 4L12 14.01l-3-3")
}
fn icon_x() -> Html {
    icon_base("M18 6L6 18M6 6l12 12")
}
fn icon_trash() -> Html {
    icon_base("M3 6h18M8 6V4h8v2M19 6l-1 14H6L5 6")
}
fn icon_inbox() -> Html {
    icon_base("M22 12h-6l-2 3h-4l-2-3H2M5.45 5.11L2 12v6a2 2 0 002 2h16a2 2 0 002-2v-6l-3.45-6.89A2 2 0 0016.76 4H7.24a2 2 0 00-1.79 1.11")
}
fn icon_history() -> Html {
    icon_base("M3 3v5h5M3.05 13a9 9 0 102.13-7.36L3 8M12 7v5l4 2")
}
fn icon_plus() -> Html {
    icon_base("M12 5v14M5 12h14")
}
fn icon_log_out() -> Html {
    icon_base("M9 21H5a2 2 0 01-2-2V5a2 2 0 012-2h4M16 17l5-5-5-5M21 12H9")
}

fn main() {
    yew::Renderer::<App>::new().render();
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn fixed_now() -> DateTime<Utc> {
        match Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0) {
            chrono::LocalResult::Single(now) => now,
            _ => unreachable!(),
        }
    }

    fn days_ago(days: i64) -> String {
        (fixed_now() - Duration::days(days)).to_rfc3339()
    }

    #[test]
    fn currency_renders_two_decimals() {
        assert_eq!(format_currency(3.0), "$3.00");
        assert_eq!(format_currency(1234.5), "$1234.50");
        assert_eq!(format_currency(0.0), "$0.00");
    }

    #[test]
    fn currency_pins_half_cent_rounding() {
        // 3.005 and 2.675 sit just below the exact half as binary doubles,
        // so both round down
        assert_eq!(format_currency(3.005), "$3.00");
        assert_eq!(format_currency(2.675), "$2.67");
    }

    #[test]
    fn currency_passes_nan_through() {
        assert_eq!(format_currency(f64::NAN), "$NaN");
    }

    #[test]
    fn currency_keeps_sign_inside() {
        assert_eq!(format_currency(-5.0), "$-5.00");
    }

    #[test]
    fn date_buckets_by_elapsed_days() {
        let now = fixed_now();
        assert_eq!(format_date(&days_ago(0), now), "Today");
        assert_eq!(format_date(&days_ago(1), now), "Yesterday");
        assert_eq!(format_date(&days_ago(3), now), "3 days ago");
        assert_eq!(format_date(&days_ago(6), now), "6 days ago");
        assert_eq!(format_date(&days_ago(7), now), "1 weeks ago");
        assert_eq!(format_date(&days_ago(10), now), "1 weeks ago");
        assert_eq!(format_date(&days_ago(29), now), "4 weeks ago");
        assert_eq!(format_date(&days_ago(30), now), "1 months ago");
        assert_eq!(format_date(&days_ago(45), now), "1 months ago");
        assert_eq!(format_date(&days_ago(364), now), "12 months ago");
    }

    #[test]
    fn date_falls_back_to_absolute_after_a_year() {
        let now = fixed_now();
        assert_eq!(format_date(&days_ago(400), now), "May 11, 2024");
        assert_eq!(format_date(&days_ago(365), now), "Jun 15, 2024");
    }

    #[test]
    fn date_accepts_naive_timestamps() {
        // the backend serializes UTC datetimes without an offset
        assert_eq!(
            format_date("2025-06-14T12:00:00.123456", fixed_now()),
            "Yesterday"
        );
        assert_eq!(format_date("2025-06-15T09:30:00", fixed_now()), "Today");
    }

    #[test]
    fn date_returns_unparseable_input_verbatim() {
        assert_eq!(format_date("not a date", fixed_now()), "not a date");
        assert_eq!(format_date("", fixed_now()), "");
    }

    #[test]
    fn card_actions_follow_role_and_status() {
        assert_eq!(
            debt_card_actions(DebtRole::Debtor, DebtStatus::Pending),
            &[DebtCardAction::Accept, DebtCardAction::Dispute]
        );
        assert_eq!(
            debt_card_actions(DebtRole::Debtor, DebtStatus::Active),
            &[DebtCardAction::MarkPaid]
        );
        assert_eq!(
            debt_card_actions(DebtRole::Creditor, DebtStatus::Pending),
            &[DebtCardAction::Cancel]
        );
        assert!(debt_card_actions(DebtRole::Creditor, DebtStatus::Active).is_empty());
        assert!(debt_card_actions(DebtRole::Debtor, DebtStatus::Paid).is_empty());
        assert!(debt_card_actions(DebtRole::Creditor, DebtStatus::Disputed).is_empty());
        assert!(debt_card_actions(DebtRole::Debtor, DebtStatus::Archived).is_empty());
    }

    #[test]
    fn role_is_derived_from_the_viewer() {
        let debt = Debt {
            id: "d1".to_string(),
            amount: 12.5,
            description: "lunch".to_string(),
            status: DebtStatus::Pending,
            creditor_username: "alice".to_string(),
            debtor_username: "bob".to_string(),
            created_at: "2025-06-01T00:00:00".to_string(),
        };
        assert_eq!(debt_role(&debt, "alice"), DebtRole::Creditor);
        assert_eq!(debt_role(&debt, "bob"), DebtRole::Debtor);
        assert_eq!(debt_role(&debt, "carol"), DebtRole::Debtor);
    }

    #[test]
    fn route_gate_protects_the_dashboard() {
        assert_eq!(
            route_gate(false, Route::Dashboard),
            Gate::Redirect(Route::Login)
        );
        assert_eq!(route_gate(true, Route::Dashboard), Gate::Allow);
    }

    #[test]
    fn route_gate_bounces_signed_in_users_off_public_pages() {
        assert_eq!(
            route_gate(true, Route::Login),
            Gate::Redirect(Route::Dashboard)
        );
        assert_eq!(
            route_gate(true, Route::Signup),
            Gate::Redirect(Route::Dashboard)
        );
        assert_eq!(route_gate(false, Route::Login), Gate::Allow);
        assert_eq!(route_gate(false, Route::Signup), Gate::Allow);
    }

    #[test]
    fn route_gate_leaves_the_landing_page_open() {
        assert_eq!(route_gate(false, Route::Landing), Gate::Allow);
        assert_eq!(route_gate(true, Route::Landing), Gate::Allow);
    }

    #[test]
    fn routes_parse_and_print_paths() {
        assert_eq!(Route::from_path("/login"), Route::Login);
        assert_eq!(Route::from_path("/signup"), Route::Signup);
        assert_eq!(Route::from_path("/dashboard"), Route::Dashboard);
        assert_eq!(Route::from_path("/"), Route::Landing);
        assert_eq!(Route::from_path("/nonsense"), Route::Landing);
        assert_eq!(Route::Dashboard.path(), "/dashboard");
    }

    #[test]
    fn new_debt_requires_every_field() {
        assert!(validate_new_debt("", "10", "lunch").is_err());
        assert!(validate_new_debt("bob", "10", "").is_err());
        assert!(validate_new_debt("   ", "10", "lunch").is_err());
    }

    #[test]
    fn new_debt_rejects_bad_amounts_before_dispatch() {
        assert!(validate_new_debt("bob", "abc", "lunch").is_err());
        assert!(validate_new_debt("bob", "", "lunch").is_err());
        assert!(validate_new_debt("bob", "0", "lunch").is_err());
        assert!(validate_new_debt("bob", "-5", "lunch").is_err());
        assert!(validate_new_debt("bob", "NaN", "lunch").is_err());
        assert!(validate_new_debt("bob", "inf", "lunch").is_err());
    }

    #[test]
    fn new_debt_trims_and_carries_the_single_type() {
        let request = match validate_new_debt("  bob ", " 12.50 ", "  lunch  ") {
            Ok(request) => request,
            Err(message) => panic!("expected valid request, got {message}"),
        };
        assert_eq!(request.debtor_username, "bob");
        assert_eq!(request.description, "lunch");
        assert_eq!(request.amount, 12.5);
        assert_eq!(request.debt_type, "single");
    }

    #[test]
    fn username_rules_match_the_backend() {
        assert!(valid_username("bob"));
        assert!(valid_username("bob_the-builder99"));
        assert!(!valid_username("ab"));
        assert!(!valid_username("has space"));
        assert!(!valid_username(&"x".repeat(31)));
    }

    #[test]
    fn pin_must_be_four_to_six_digits() {
        assert!(valid_pin("1234"));
        assert!(valid_pin("123456"));
        assert!(!valid_pin("123"));
        assert!(!valid_pin("1234567"));
        assert!(!valid_pin("12a4"));
        assert!(!valid_pin(""));
    }

    #[test]
    fn empty_states_keep_their_copy() {
        assert_eq!(
            empty_state_copy(Tab::Owed),
            ("No debts owed to you", "Create a new debt to get started")
        );
        assert_eq!(
            empty_state_copy(Tab::Owing),
            ("You're all clear!", "No outstanding debts")
        );
        assert_eq!(
            empty_state_copy(Tab::Notifications),
            ("No notifications", "You're all caught up!")
        );
        assert_eq!(
            empty_state_copy(Tab::History),
            ("No history yet", "Completed debts will appear here")
        );
    }

    #[test]
    fn debt_statuses_deserialize_leniently() {
        let raw = r#"{
            "id": "abc",
            "amount": 20.0,
            "description": "concert tickets",
            "status": "archived",
            "creditor_username": "alice",
            "debtor_username": "bob",
            "created_at": "2025-01-01T00:00:00"
        }"#;
        let debt: Debt = serde_json::from_str(raw).unwrap();
        assert_eq!(debt.status, DebtStatus::Archived);

        let odd = raw.replace("archived", "something_new");
        let debt: Debt = serde_json::from_str(&odd).unwrap();
        assert_eq!(debt.status, DebtStatus::Unknown);
        assert_eq!(debt.status.label(), "unknown");
    }

    #[test]
    fn my_debts_payload_carries_totals() {
        let raw = r#"{
            "owed_to_me": [],
            "i_owe": [],
            "total_owed_to_me": 42.5,
            "total_i_owe": 10.0
        }"#;
        let payload: MyDebts = serde_json::from_str(raw).unwrap();
        assert!(payload.owed_to_me.is_empty());
        assert_eq!(payload.total_owed_to_me, 42.5);
        assert_eq!(payload.total_i_owe, 10.0);
    }
}
