// Shared across integration-test binaries; each one exercises a subset.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;

use rednote_scout::browser::surface::{
    BrowserError, BrowserPage, Cookie, NodeRef, FORCE_CLICK_SCRIPT,
};

const BASE: &str = "https://www.xiaohongshu.com";

/// How an item's activation target reacts to interaction, mirroring the
/// real page's moods: some cards open on a plain click, some silently
/// ignore trusted clicks and only react to synthetic events, some never
/// open at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    Standard,
    ScriptOnly,
    Never,
}

#[derive(Debug, Clone)]
pub struct DetailSpec {
    pub title: String,
    pub content: String,
    pub like: String,
    pub collect: String,
    pub comment: String,
    pub tags: Vec<String>,
    pub publish_time: String,
    pub author: String,
    pub dead_marker: Option<String>,
}

impl Default for DetailSpec {
    fn default() -> Self {
        Self {
            title: "弹窗标题".to_string(),
            content: "弹窗正文内容".to_string(),
            like: "1.2万".to_string(),
            collect: "3千".to_string(),
            comment: "86".to_string(),
            tags: vec!["咖啡".to_string()],
            publish_time: "2024-06-01".to_string(),
            author: "测试作者".to_string(),
            dead_marker: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ItemSpec {
    pub key: String,
    pub title: String,
    pub like_text: String,
    pub activation: Activation,
    pub trigger_login_popup: bool,
    pub detail: DetailSpec,
}

impl ItemSpec {
    pub fn new(key: &str, title: &str) -> Self {
        Self {
            key: key.to_string(),
            title: title.to_string(),
            like_text: "100".to_string(),
            activation: Activation::Standard,
            trigger_login_popup: false,
            detail: DetailSpec {
                title: format!("{title} · 详情"),
                ..DetailSpec::default()
            },
        }
    }

    pub fn activation(mut self, activation: Activation) -> Self {
        self.activation = activation;
        self
    }

    pub fn triggers_login_popup(mut self) -> Self {
        self.trigger_login_popup = true;
        self
    }

    pub fn dead(mut self, marker: &str) -> Self {
        self.detail.dead_marker = Some(marker.to_string());
        self
    }
}

#[derive(Debug, Clone)]
pub struct TrendingSpec {
    pub name: String,
    pub rank: String,
    pub heat: String,
}

#[derive(Debug, Clone)]
struct Node {
    tag: String,
    classes: Vec<String>,
    id_attr: Option<String>,
    attrs: HashMap<String, String>,
    text: String,
    visible: bool,
    parent: Option<u64>,
    children: Vec<u64>,
}

struct PageState {
    url: String,
    prior_url: Option<String>,
    next_id: u64,
    nodes: HashMap<u64, Node>,
    cookies: Vec<Cookie>,
    items: Vec<ItemSpec>,
    trending: Vec<TrendingSpec>,
    feed_tags: Vec<String>,
    login_popup: bool,
    rerender_on_close: bool,
    generation: usize,
    revealed: usize,
    initial_visible: Option<usize>,
    overlay_for: Option<usize>,
    panel_open: bool,
    trending_visible: bool,
    events: Vec<String>,
}

pub struct FakePage {
    state: Mutex<PageState>,
}

#[derive(Default)]
pub struct FakePageBuilder {
    items: Vec<ItemSpec>,
    cookies: Vec<Cookie>,
    trending: Vec<TrendingSpec>,
    feed_tags: Vec<String>,
    login_popup: bool,
    rerender_on_close: bool,
    initial_visible: Option<usize>,
}

impl FakePageBuilder {
    pub fn items(mut self, items: Vec<ItemSpec>) -> Self {
        self.items = items;
        self
    }

    pub fn logged_in(mut self) -> Self {
        self.cookies.push(Cookie {
            name: "web_session".to_string(),
            value: "session-token".to_string(),
        });
        self
    }

    pub fn cookie(mut self, name: &str, value: &str) -> Self {
        self.cookies.push(Cookie {
            name: name.to_string(),
            value: value.to_string(),
        });
        self
    }

    pub fn login_popup(mut self) -> Self {
        self.login_popup = true;
        self
    }

    pub fn rerender_on_close(mut self) -> Self {
        self.rerender_on_close = true;
        self
    }

    pub fn initially_visible(mut self, count: usize) -> Self {
        self.initial_visible = Some(count);
        self
    }

    pub fn trending(mut self, trending: Vec<TrendingSpec>) -> Self {
        self.trending = trending;
        self
    }

    pub fn feed_tags(mut self, tags: Vec<&str>) -> Self {
        self.feed_tags = tags.into_iter().map(str::to_string).collect();
        self
    }

    pub fn build(self) -> Arc<FakePage> {
        let total = self.items.len();
        let mut state = PageState {
            url: String::new(),
            prior_url: None,
            next_id: 1,
            nodes: HashMap::new(),
            cookies: self.cookies,
            items: self.items,
            trending: self.trending,
            feed_tags: self.feed_tags,
            login_popup: self.login_popup,
            rerender_on_close: self.rerender_on_close,
            generation: 0,
            revealed: self.initial_visible.unwrap_or(total),
            initial_visible: self.initial_visible,
            overlay_for: None,
            panel_open: false,
            trending_visible: false,
            events: Vec::new(),
        };
        state.rebuild();
        Arc::new(FakePage {
            state: Mutex::new(state),
        })
    }
}

impl FakePage {
    pub fn builder() -> FakePageBuilder {
        FakePageBuilder::default()
    }

    pub fn events(&self) -> Vec<String> {
        self.state.lock().events.clone()
    }

    pub fn overlay_open(&self) -> bool {
        self.state.lock().overlay_for.is_some()
    }

    pub fn set_login_popup(&self, present: bool) {
        let mut state = self.state.lock();
        state.login_popup = present;
        state.rebuild();
    }

    pub fn set_cookie(&self, name: &str, value: &str) {
        let mut state = self.state.lock();
        state.cookies.retain(|cookie| cookie.name != name);
        state.cookies.push(Cookie {
            name: name.to_string(),
            value: value.to_string(),
        });
    }

    pub fn clear_cookies(&self) {
        self.state.lock().cookies.clear();
    }
}

impl PageState {
    fn record(&mut self, event: String) {
        self.events.push(event);
    }

    fn add_node(&mut self, parent: u64, tag: &str, classes: &[&str], text: &str) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.nodes.insert(
            id,
            Node {
                tag: tag.to_string(),
                classes: classes.iter().map(|c| c.to_string()).collect(),
                id_attr: None,
                attrs: HashMap::new(),
                text: text.to_string(),
                visible: true,
                parent: Some(parent),
                children: Vec::new(),
            },
        );
        if let Some(node) = self.nodes.get_mut(&parent) {
            node.children.push(id);
        }
        id
    }

    fn set_dom_id(&mut self, id: u64, dom_id: &str) {
        if let Some(node) = self.nodes.get_mut(&id) {
            node.id_attr = Some(dom_id.to_string());
        }
    }

    fn set_attr(&mut self, id: u64, key: &str, value: &str) {
        if let Some(node) = self.nodes.get_mut(&id) {
            node.attrs.insert(key.to_string(), value.to_string());
        }
    }

    /// Rebuilds the whole tree for the current logical state. Every rebuild
    /// mints fresh node ids, which is exactly what the SPA's virtualized
    /// re-renders do to real node handles.
    fn rebuild(&mut self) {
        self.nodes.clear();
        self.nodes.insert(
            0,
            Node {
                tag: "html".to_string(),
                classes: Vec::new(),
                id_attr: None,
                attrs: HashMap::new(),
                text: String::new(),
                visible: true,
                parent: None,
                children: Vec::new(),
            },
        );

        if self.login_popup {
            let popup = self.add_node(0, "div", &["login-container"], "扫码登录");
            let qr = self.add_node(popup, "img", &["qrcode-img"], "");
            self.set_attr(qr, "src", "https://cdn.example.com/qrcode/login.png");
        }

        // While an overlay is open the address bar shows the note URL, but
        // the background page underneath is unchanged; build it from the
        // surface the user is actually on.
        let surface_url = self
            .prior_url
            .clone()
            .unwrap_or_else(|| self.url.clone());
        if surface_url.contains("search_result") {
            self.build_search_surface();
        } else if !surface_url.is_empty() {
            self.build_home_surface();
        }

        if self.overlay_for.is_some() {
            self.build_overlay();
        }
    }

    fn build_search_surface(&mut self) {
        self.add_node(0, "div", &["filter"], "筛选");
        if self.panel_open {
            let panel = self.add_node(0, "div", &["filter-panel"], "");
            for label in [
                "综合", "最新", "最多点赞", "最多评论", "最多收藏", "不限", "一天内", "一周内",
                "半年内",
            ] {
                self.add_node(panel, "span", &["option"], label);
            }
        }

        let feed = self.add_node(0, "div", &["feeds-page"], "");
        let visible = self.revealed.min(self.items.len());
        let rotation = if self.items.is_empty() {
            0
        } else {
            self.generation % self.items.len()
        };
        for offset in 0..visible {
            let index = (offset + rotation) % self.items.len();
            let spec = self.items[index].clone();
            let item = self.add_node(feed, "section", &["note-item"], "");
            let cover = self.add_node(item, "a", &["cover"], "");
            self.set_attr(
                cover,
                "href",
                &format!("{}?xsec_token=tok{}", spec.key, self.generation),
            );
            self.add_node(item, "a", &["title"], &spec.title);
            let like = self.add_node(item, "div", &["like-wrapper"], "");
            self.add_node(like, "span", &["count"], &spec.like_text);
        }
    }

    fn build_home_surface(&mut self) {
        let input = self.add_node(0, "input", &[], "");
        self.set_dom_id(input, "search-input");

        if self.trending_visible {
            let panel = self.add_node(0, "div", &["search-trending"], "");
            for spec in self.trending.clone() {
                let item = self.add_node(panel, "div", &["trending-item"], "");
                self.add_node(item, "span", &["title"], &spec.name);
                self.add_node(item, "span", &["rank"], &spec.rank);
                self.add_node(item, "span", &["hot-score"], &spec.heat);
            }
        }

        for tag in self.feed_tags.clone() {
            let anchor = self.add_node(0, "a", &["hashtag"], &format!("#{tag}"));
            self.set_attr(anchor, "href", &format!("/page/topics/{tag}"));
        }
    }

    fn build_overlay(&mut self) {
        let Some(index) = self.overlay_for else {
            return;
        };
        let spec = self.items[index].detail.clone();

        let mask = self.add_node(0, "div", &["note-detail-mask"], "");
        self.add_node(mask, "div", &["close-box"], "");

        let container = self.add_node(mask, "div", &[], "");
        self.set_dom_id(container, "noteContainer");

        if let Some(marker) = &spec.dead_marker {
            self.add_node(container, "div", &["error-tip"], &marker.clone());
            return;
        }

        let content_box = self.add_node(container, "div", &["note-content"], "");
        self.add_node(content_box, "div", &["title"], &spec.title);
        let desc = self.add_node(content_box, "div", &["desc"], "");
        self.add_node(desc, "div", &["note-text"], &spec.content);

        let interaction = self.add_node(container, "div", &["interaction-container"], "");
        let like = self.add_node(interaction, "span", &["like-wrapper"], "");
        self.add_node(like, "span", &["count"], &spec.like);
        let collect = self.add_node(interaction, "span", &["collect-wrapper"], "");
        self.add_node(collect, "span", &["count"], &spec.collect);
        let chat = self.add_node(interaction, "span", &["chat-wrapper"], "");
        self.add_node(chat, "span", &["count"], &spec.comment);

        for tag in &spec.tags {
            let anchor = self.add_node(container, "a", &["tag"], &tag.clone());
            self.set_attr(anchor, "href", &format!("/page/topics/{tag}"));
        }

        let bottom = self.add_node(container, "div", &["bottom-container"], "");
        self.add_node(bottom, "span", &["date"], &spec.publish_time);
        let author = self.add_node(container, "div", &["author-container"], "");
        self.add_node(author, "span", &["username"], &spec.author);
    }

    fn open_overlay(&mut self, index: usize) {
        self.prior_url = Some(self.url.clone());
        let key = self.items[index].key.clone();
        self.url = format!("{BASE}{key}?source=overlay");
        self.overlay_for = Some(index);
        if self.items[index].trigger_login_popup {
            // One-shot: the prompt appears when this overlay opens and is
            // cleared by the (simulated) manual login.
            self.items[index].trigger_login_popup = false;
            self.login_popup = true;
        }
        self.record(format!("overlay-open:{key}"));
        self.rebuild();
    }

    fn close_overlay(&mut self) {
        if let Some(index) = self.overlay_for.take() {
            let event = format!("overlay-close:{}", self.items[index].key);
            self.record(event);
        }
        if let Some(prior) = self.prior_url.take() {
            self.url = prior;
        }
        if self.rerender_on_close {
            self.generation += 1;
        }
        self.rebuild();
    }

    fn item_index_for_href(&self, href: &str) -> Option<usize> {
        self.items.iter().position(|item| href.starts_with(&item.key))
    }

    fn collect_text(&self, id: u64, out: &mut Vec<String>) {
        if let Some(node) = self.nodes.get(&id) {
            if !node.text.is_empty() {
                out.push(node.text.clone());
            }
            for child in &node.children {
                self.collect_text(*child, out);
            }
        }
    }
}

// ---- minimal CSS subset ---------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
enum AttrOp {
    Exists,
    Equals,
    Contains,
}

#[derive(Debug, Clone, Default)]
struct SimplePart {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attrs: Vec<(String, AttrOp, String)>,
}

fn parse_selector(selector: &str) -> Result<Vec<SimplePart>, BrowserError> {
    let parts: Vec<&str> = selector.split_whitespace().collect();
    if parts.is_empty() {
        return Err(BrowserError::InvalidSelector(selector.to_string()));
    }
    parts.iter().map(|part| parse_part(part, selector)).collect()
}

fn parse_part(part: &str, full: &str) -> Result<SimplePart, BrowserError> {
    let mut parsed = SimplePart::default();
    let mut rest = part;

    let tag_end = rest
        .find(|c| c == '.' || c == '#' || c == '[')
        .unwrap_or(rest.len());
    if tag_end > 0 {
        parsed.tag = Some(rest[..tag_end].to_string());
    }
    rest = &rest[tag_end..];

    while !rest.is_empty() {
        if let Some(stripped) = rest.strip_prefix('.') {
            let end = stripped
                .find(|c| c == '.' || c == '#' || c == '[')
                .unwrap_or(stripped.len());
            parsed.classes.push(stripped[..end].to_string());
            rest = &stripped[end..];
        } else if let Some(stripped) = rest.strip_prefix('#') {
            let end = stripped
                .find(|c| c == '.' || c == '[')
                .unwrap_or(stripped.len());
            parsed.id = Some(stripped[..end].to_string());
            rest = &stripped[end..];
        } else if let Some(stripped) = rest.strip_prefix('[') {
            let end = stripped
                .find(']')
                .ok_or_else(|| BrowserError::InvalidSelector(full.to_string()))?;
            let body = &stripped[..end];
            let (name, op, value) = if let Some((name, value)) = body.split_once("*=") {
                (name, AttrOp::Contains, value)
            } else if let Some((name, value)) = body.split_once('=') {
                (name, AttrOp::Equals, value)
            } else {
                (body, AttrOp::Exists, "")
            };
            parsed.attrs.push((
                name.to_string(),
                op,
                value.trim_matches(|c| c == '"' || c == '\'').to_string(),
            ));
            rest = &stripped[end + 1..];
        } else {
            return Err(BrowserError::InvalidSelector(full.to_string()));
        }
    }
    Ok(parsed)
}

fn part_matches(node: &Node, part: &SimplePart) -> bool {
    if let Some(tag) = &part.tag {
        if &node.tag != tag {
            return false;
        }
    }
    if let Some(id) = &part.id {
        if node.id_attr.as_deref() != Some(id.as_str()) {
            return false;
        }
    }
    for class in &part.classes {
        if !node.classes.iter().any(|c| c == class) {
            return false;
        }
    }
    for (name, op, value) in &part.attrs {
        let Some(actual) = node.attrs.get(name) else {
            return false;
        };
        let ok = match op {
            AttrOp::Exists => true,
            AttrOp::Equals => actual == value,
            AttrOp::Contains => actual.contains(value.as_str()),
        };
        if !ok {
            return false;
        }
    }
    true
}

impl PageState {
    fn descendants(&self, root: u64) -> Vec<u64> {
        let mut out = Vec::new();
        let mut stack: Vec<u64> = self
            .nodes
            .get(&root)
            .map(|n| n.children.iter().rev().copied().collect())
            .unwrap_or_default();
        while let Some(id) = stack.pop() {
            out.push(id);
            if let Some(node) = self.nodes.get(&id) {
                for child in node.children.iter().rev() {
                    stack.push(*child);
                }
            }
        }
        out
    }

    fn matches_path(&self, id: u64, parts: &[SimplePart]) -> bool {
        let Some(node) = self.nodes.get(&id) else {
            return false;
        };
        let Some((last, ancestors)) = parts.split_last() else {
            return false;
        };
        if !part_matches(node, last) {
            return false;
        }
        // Ancestor compounds may match above the query root, as real
        // querySelector scoping does.
        let reversed: Vec<&SimplePart> = ancestors.iter().rev().collect();
        let mut next = 0usize;
        let mut cursor = node.parent;
        while next < reversed.len() {
            let Some(current) = cursor else {
                return false;
            };
            let Some(candidate) = self.nodes.get(&current) else {
                return false;
            };
            if part_matches(candidate, reversed[next]) {
                next += 1;
            }
            cursor = candidate.parent;
        }
        true
    }

    fn select(&self, root: u64, selector: &str) -> Result<Vec<u64>, BrowserError> {
        let parts = parse_selector(selector)?;
        Ok(self
            .descendants(root)
            .into_iter()
            .filter(|id| self.matches_path(*id, &parts))
            .collect())
    }

    fn visible_with_ancestors(&self, id: u64) -> bool {
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            let Some(node) = self.nodes.get(&current) else {
                return false;
            };
            if !node.visible {
                return false;
            }
            cursor = node.parent;
        }
        true
    }
}

#[async_trait]
impl BrowserPage for FakePage {
    async fn navigate(&self, url: &str) -> Result<(), BrowserError> {
        let mut state = self.state.lock();
        state.record(format!("navigate:{url}"));
        state.url = url.to_string();
        state.prior_url = None;
        state.overlay_for = None;
        state.panel_open = false;
        state.trending_visible = false;
        state.revealed = state.initial_visible.unwrap_or(state.items.len());
        state.rebuild();
        Ok(())
    }

    async fn current_url(&self) -> Result<String, BrowserError> {
        Ok(self.state.lock().url.clone())
    }

    async fn query(&self, root: NodeRef, selector: &str) -> Result<Option<NodeRef>, BrowserError> {
        let state = self.state.lock();
        if !state.nodes.contains_key(&root.0) {
            return Ok(None);
        }
        Ok(state.select(root.0, selector)?.first().map(|id| NodeRef(*id)))
    }

    async fn query_all(
        &self,
        root: NodeRef,
        selector: &str,
    ) -> Result<Vec<NodeRef>, BrowserError> {
        let state = self.state.lock();
        if !state.nodes.contains_key(&root.0) {
            return Ok(Vec::new());
        }
        Ok(state
            .select(root.0, selector)?
            .into_iter()
            .map(NodeRef)
            .collect())
    }

    async fn contains(&self, ancestor: NodeRef, node: NodeRef) -> Result<bool, BrowserError> {
        let state = self.state.lock();
        if !state.nodes.contains_key(&node.0) {
            return Ok(false);
        }
        if ancestor == NodeRef::DOCUMENT {
            return Ok(true);
        }
        let mut cursor = state.nodes.get(&node.0).and_then(|n| n.parent);
        while let Some(current) = cursor {
            if current == ancestor.0 {
                return Ok(true);
            }
            cursor = state.nodes.get(&current).and_then(|n| n.parent);
        }
        Ok(false)
    }

    async fn text(&self, node: NodeRef) -> Result<String, BrowserError> {
        let state = self.state.lock();
        if !state.nodes.contains_key(&node.0) {
            return Err(BrowserError::StaleNode(node));
        }
        let mut pieces = Vec::new();
        state.collect_text(node.0, &mut pieces);
        Ok(pieces.join("\n"))
    }

    async fn attribute(&self, node: NodeRef, name: &str) -> Result<Option<String>, BrowserError> {
        let state = self.state.lock();
        let entry = state
            .nodes
            .get(&node.0)
            .ok_or(BrowserError::StaleNode(node))?;
        Ok(entry.attrs.get(name).cloned())
    }

    async fn is_visible(&self, node: NodeRef) -> Result<bool, BrowserError> {
        Ok(self.state.lock().visible_with_ancestors(node.0))
    }

    async fn click(&self, node: NodeRef) -> Result<(), BrowserError> {
        let mut state = self.state.lock();
        let entry = state
            .nodes
            .get(&node.0)
            .ok_or(BrowserError::StaleNode(node))?
            .clone();

        if let Some(href) = entry.attrs.get("href") {
            if let Some(index) = state.item_index_for_href(href) {
                match state.items[index].activation {
                    Activation::Standard => state.open_overlay(index),
                    Activation::ScriptOnly | Activation::Never => {
                        let event = format!("ignored-click:{}", state.items[index].key);
                        state.record(event);
                    }
                }
                return Ok(());
            }
        }
        if entry.classes.iter().any(|c| c == "close-box") {
            state.close_overlay();
            return Ok(());
        }
        if entry.id_attr.as_deref() == Some("search-input") {
            state.trending_visible = true;
            state.record("search-input-focused".to_string());
            state.rebuild();
            return Ok(());
        }
        if entry.classes.iter().any(|c| c == "option") {
            state.record(format!("filter:{}", entry.text));
            return Ok(());
        }
        if entry.classes.iter().any(|c| c == "filter") {
            // Trusted clicks on the filter control are swallowed; only the
            // synthetic script event opens the panel.
            state.record("filter-click-swallowed".to_string());
            return Ok(());
        }
        state.record(format!("click:{}", entry.tag));
        Ok(())
    }

    async fn evaluate(
        &self,
        script: &str,
        target: Option<NodeRef>,
    ) -> Result<Value, BrowserError> {
        if script != FORCE_CLICK_SCRIPT {
            return Ok(Value::Null);
        }
        let Some(target) = target else {
            return Ok(Value::Null);
        };
        let mut state = self.state.lock();
        let entry = state
            .nodes
            .get(&target.0)
            .ok_or(BrowserError::StaleNode(target))?
            .clone();

        if let Some(href) = entry.attrs.get("href") {
            if let Some(index) = state.item_index_for_href(href) {
                match state.items[index].activation {
                    Activation::Standard | Activation::ScriptOnly => state.open_overlay(index),
                    Activation::Never => {
                        let event = format!("ignored-script-click:{}", state.items[index].key);
                        state.record(event);
                    }
                }
                return Ok(Value::Bool(true));
            }
        }
        if entry.classes.iter().any(|c| c == "filter") {
            state.panel_open = true;
            state.record("filter-panel-opened".to_string());
            state.rebuild();
            return Ok(Value::Bool(true));
        }
        Ok(Value::Null)
    }

    async fn dispatch_key(&self, key: &str) -> Result<(), BrowserError> {
        let mut state = self.state.lock();
        state.record(format!("key:{key}"));
        if key == "Escape" && state.overlay_for.is_some() {
            state.close_overlay();
        }
        Ok(())
    }

    async fn scroll_into_view(&self, _node: NodeRef) -> Result<(), BrowserError> {
        Ok(())
    }

    async fn scroll_by(&self, delta_y: i64) -> Result<(), BrowserError> {
        let mut state = self.state.lock();
        state.record(format!("scroll:{delta_y}"));
        if state.revealed < state.items.len() {
            state.revealed += 1;
            state.rebuild();
        }
        Ok(())
    }

    async fn read_cookies(&self, _url: &str) -> Result<Vec<Cookie>, BrowserError> {
        Ok(self.state.lock().cookies.clone())
    }
}
