//! End-to-end controller scenarios against in-memory backends.

use std::cell::RefCell;

use planilla_core::{
    Activation, Affordance, Control, ControlBinder, ControlHandle, ControlSurface, Enablement,
    GridDescriptor, GridId, LifecycleError, LookupFailure, NoticeLevel, PanelImage, Payload,
    PersistenceError, PhotoLookup, PhotoResolver, RecordStore, RowId, RowLifecycle, RowState,
    SaveReceipt, ValidationError, NOTICE_TTL,
};

// ── Fakes ───────────────────────────────────────────────────────────

struct FakeStore {
    calls: RefCell<Vec<(String, serde_json::Value)>>,
    response: Result<SaveReceipt, PersistenceError>,
}

impl FakeStore {
    fn ok() -> Self {
        Self { calls: RefCell::new(Vec::new()), response: Ok(SaveReceipt::default()) }
    }

    fn failing(status: u16, body: &str) -> Self {
        Self {
            calls: RefCell::new(Vec::new()),
            response: Err(PersistenceError::Http { status, body: body.into() }),
        }
    }

    fn call_count(&self) -> usize {
        self.calls.borrow().len()
    }
}

impl RecordStore for FakeStore {
    fn persist(&self, endpoint: &str, payload: &Payload) -> Result<SaveReceipt, PersistenceError> {
        self.calls.borrow_mut().push((endpoint.to_string(), payload.to_json()));
        self.response.clone()
    }
}

struct FakePhotos(Result<serde_json::Value, LookupFailure>);

impl PhotoResolver for FakePhotos {
    fn resolve(&self, _identifier: &str) -> Result<PhotoLookup, LookupFailure> {
        self.0
            .clone()
            .map(|body| PhotoLookup::from_response(&body, "/static/fotos/"))
    }
}

// ── Fixtures ────────────────────────────────────────────────────────

const PERSONAL: &str = "tablaEmpleados";
const ACADEMIC: &str = "tablaAcademica";

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Two grids: personal data (unlocked) and academic history (first three
/// columns locked, seven columns).
fn lifecycle() -> (RowLifecycle, RowId, RowId) {
    let mut lc = RowLifecycle::new("/static/imagenes/default.png");
    lc.add_grid(GridId::from(PERSONAL));
    lc.add_grid(GridId::from(ACADEMIC));

    assert!(lc.register(
        GridDescriptor::new(PERSONAL, "/api/empleados", strings(&["Numero de DPI", "Name", "Apellidos"]))
            .unwrap()
    ));
    assert!(lc.register(
        GridDescriptor::new(
            ACADEMIC,
            "/api/academico",
            strings(&["Numero de DPI", "Nivel", "Titulo", "Establecimiento", "Año", "Ciudad", "Notas"]),
        )
        .unwrap()
        .with_locked_columns([0, 1, 2])
        .unwrap()
    ));

    let personal = lc
        .load_records(
            &GridId::from(PERSONAL),
            &[serde_json::json!({"Numero de DPI": "1234", "Name": "Ana", "Apellidos": "Lopez"})],
        )
        .unwrap();
    assert_eq!(personal, 1);
    lc.load_records(
        &GridId::from(ACADEMIC),
        &[serde_json::json!(["5678", "Licenciatura", "Contaduria", "USAC", "2010", "Guatemala", ""])],
    )
    .unwrap();

    let r1 = lc.page().table(&GridId::from(PERSONAL)).unwrap().rows()[0].id();
    let r2 = lc.page().table(&GridId::from(ACADEMIC)).unwrap().rows()[0].id();
    (lc, r1, r2)
}

// ── Scenarios ───────────────────────────────────────────────────────

#[test]
fn scenario_a_double_pick_edit_and_save() {
    let (mut lc, r1, _) = lifecycle();
    let store = FakeStore::ok();

    assert_eq!(lc.double_pick(r1).unwrap(), RowState::EditingExisting);
    lc.set_cell(1, "Ana Maria").unwrap();
    assert_eq!(lc.save(&store).unwrap(), RowState::Idle);

    let calls = store.calls.borrow();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, "/api/empleados");
    assert_eq!(
        calls[0].1,
        serde_json::json!({"Numero de DPI": "1234", "Name": "Ana Maria", "Apellidos": "Lopez", "nuevo": false})
    );

    let row = lc.page().row(r1).unwrap();
    assert!(!row.is_editing());
    assert!(!row.is_selected());
    assert!(!(0..3).any(|c| row.is_mutable(c)));

    let controls = Enablement::for_state(lc.state());
    assert!(!controls.save && !controls.cancel && !controls.edit);

    lc.pick(r1).unwrap();
    assert!(Enablement::for_state(lc.state()).edit);

    let notice = lc.drain_notices().pop().unwrap();
    assert_eq!(notice.level, NoticeLevel::Success);
}

#[test]
fn scenario_b_add_without_identifier_never_reaches_network() {
    let (mut lc, _, _) = lifecycle();
    let store = FakeStore::ok();

    assert_eq!(lc.add().unwrap(), RowState::EditingNew);
    lc.set_cell(1, "Sin DPI").unwrap();

    let err = lc.save(&store).unwrap_err();
    assert_eq!(
        err,
        LifecycleError::Validation(ValidationError::MissingIdentifier { field: "Numero de DPI".into() })
    );
    assert_eq!(store.call_count(), 0);
    assert_eq!(lc.state(), RowState::EditingNew);
    assert!(lc.active_row().unwrap().is_mutable(0));
    assert_eq!(lc.notices().last().unwrap().level, NoticeLevel::Danger);
}

#[test]
fn scenario_c_locked_columns_stay_locked_while_adding() {
    let (mut lc, r1, _) = lifecycle();

    lc.pick(r1).unwrap();
    assert_eq!(lc.add_to(&GridId::from(ACADEMIC)).unwrap(), RowState::EditingNew);
    let row = lc.active_row().unwrap();
    assert_eq!(row.len(), 7);
    assert!(row.is_new());
    assert_eq!(row.cell(0), Some("1234"));
    for column in 0..3 {
        assert!(!row.is_mutable(column), "column {} should be locked", column);
    }
    for column in 3..7 {
        assert!(row.is_mutable(column), "column {} should be open", column);
    }

    for column in 0..3 {
        assert_eq!(lc.set_cell(column, "x"), Err(LifecycleError::CellLocked { column }));
    }
    lc.set_cell(3, "USAC").unwrap();
    assert_eq!(lc.active_row().unwrap().cell(3), Some("USAC"));
    assert!((0..3).all(|c| !lc.active_row().unwrap().is_mutable(c)));
}

#[test]
fn scenario_d_pick_in_other_grid_moves_the_active_row() {
    let (mut lc, r1, r2) = lifecycle();

    lc.pick(r1).unwrap();
    assert!(lc.page().row(r1).unwrap().is_selected());

    assert_eq!(lc.pick(r2).unwrap(), RowState::Selected);
    assert!(!lc.page().row(r1).unwrap().is_selected());
    assert!(lc.page().row(r2).unwrap().is_selected());
    assert_eq!(lc.page().selected_count(), 1);
    assert_eq!(lc.active_descriptor().unwrap().id().as_str(), ACADEMIC);
}

#[test]
fn scenario_e_empty_photo_result_offers_upload() {
    let (mut lc, r1, r2) = lifecycle();

    lc.pick(r2).unwrap();
    assert_eq!(lc.panel().identifier(), Some("5678"));
    assert_eq!(lc.panel().affordance(), Affordance::Hidden);

    lc.resolve_photo(&FakePhotos(Ok(serde_json::json!({}))));
    assert_eq!(lc.panel().image(), &PanelImage::Placeholder);
    assert_eq!(lc.panel().affordance(), Affordance::Upload);

    lc.pick(r1).unwrap();
    lc.resolve_photo(&FakePhotos(Ok(serde_json::json!({"foto": "1234_1.jpg"}))));
    assert_eq!(lc.panel().image(), &PanelImage::Photo("/static/fotos/1234_1.jpg".into()));
    assert_eq!(lc.panel().affordance(), Affordance::Remove);
}

// ── Invariants and policies ─────────────────────────────────────────

#[test]
fn at_most_one_selected_row_through_a_session() {
    let (mut lc, r1, r2) = lifecycle();
    let store = FakeStore::ok();

    let check = |lc: &RowLifecycle| assert!(lc.page().selected_count() <= 1);
    lc.pick(r1).unwrap();
    check(&lc);
    lc.pick(r2).unwrap();
    check(&lc);
    lc.add().unwrap();
    check(&lc);
    lc.set_cell(3, "x").unwrap();
    lc.cancel().unwrap();
    check(&lc);
    lc.double_pick(r1).unwrap();
    check(&lc);
    lc.save(&store).unwrap();
    check(&lc);
    assert_eq!(lc.page().selected_count(), 0);
}

#[test]
fn cancel_after_edit_restores_exact_cells() {
    let (mut lc, r1, _) = lifecycle();
    let before = lc.page().row(r1).unwrap().cells().to_vec();

    lc.pick(r1).unwrap();
    lc.edit().unwrap();
    lc.set_cell(1, "  Otra ").unwrap();
    lc.set_cell(2, "").unwrap();
    assert_eq!(lc.cancel().unwrap(), RowState::Idle);

    let row = lc.page().row(r1).unwrap();
    assert_eq!(row.cells(), before.as_slice());
    assert!(!row.is_editing());
    assert!(lc.session().is_none());
}

#[test]
fn cancel_after_add_removes_the_row() {
    let (mut lc, _, _) = lifecycle();
    let grid = GridId::from(PERSONAL);

    lc.add_to(&grid).unwrap();
    let new_row = lc.active_row().unwrap().id();
    assert_eq!(lc.page().table(&grid).unwrap().rows()[0].id(), new_row);

    lc.cancel().unwrap();
    assert!(lc.page().row(new_row).is_none());
    assert!(lc.page().rows().all(|r| r.id() != new_row));
    assert_eq!(lc.page().table(&grid).unwrap().len(), 1);
    assert_eq!(lc.state(), RowState::Idle);
}

#[test]
fn add_to_grid_with_locked_identifier_inherits_it_and_saves() {
    let (mut lc, r1, r2) = lifecycle();
    let store = FakeStore::ok();
    let academic = GridId::from(ACADEMIC);

    lc.pick(r2).unwrap();
    lc.add().unwrap();
    assert_eq!(lc.active_descriptor().unwrap().id(), &academic);
    assert_eq!(lc.active_row().unwrap().cell(0), Some("5678"));
    assert_eq!(lc.panel().identifier(), Some("5678"));
    for column in 3..7 {
        lc.set_cell(column, "x").unwrap();
    }
    assert_eq!(lc.save(&store).unwrap(), RowState::Idle);
    {
        let calls = store.calls.borrow();
        assert_eq!(calls[0].0, "/api/academico");
        assert_eq!(calls[0].1["Numero de DPI"], "5678");
        assert_eq!(calls[0].1["nuevo"], true);
    }

    // Adding across grids takes the identifier of the row picked elsewhere.
    lc.pick(r1).unwrap();
    lc.add_to(&academic).unwrap();
    assert_eq!(lc.active_row().unwrap().cell(0), Some("1234"));
    assert_eq!(lc.session().unwrap().original_cells[0], "1234");
    lc.cancel().unwrap();
    assert_eq!(lc.page().table(&academic).unwrap().len(), 2);
}

#[test]
fn add_to_grid_with_locked_identifier_needs_a_selected_row() {
    let (mut lc, _, _) = lifecycle();
    let academic = GridId::from(ACADEMIC);

    assert_eq!(
        lc.add_to(&academic),
        Err(LifecycleError::NoIdentifierSource { field: "Numero de DPI".into() })
    );
    assert_eq!(lc.state(), RowState::Idle);
    assert_eq!(lc.page().table(&academic).unwrap().len(), 1);
    assert_eq!(lc.notices().last().unwrap().level, NoticeLevel::Warning);
}

#[test]
fn add_without_active_grid_uses_first_registered() {
    let (mut lc, _, r2) = lifecycle();
    lc.add().unwrap();
    assert_eq!(lc.active_descriptor().unwrap().id().as_str(), PERSONAL);
    lc.cancel().unwrap();

    lc.pick(r2).unwrap();
    lc.add().unwrap();
    assert_eq!(lc.active_descriptor().unwrap().id().as_str(), ACADEMIC);
    assert!(!lc.page().row(r2).unwrap().is_selected());
}

#[test]
fn add_with_no_grids_warns() {
    let mut lc = RowLifecycle::new("/p.png");
    assert_eq!(lc.add(), Err(LifecycleError::NoTargetGrid));
    assert_eq!(lc.notices().last().unwrap().level, NoticeLevel::Warning);
}

#[test]
fn registration_without_surface_is_skipped() {
    let mut lc = RowLifecycle::new("/p.png");
    let d = GridDescriptor::new("tablaMedica", "/api/medico", strings(&["Numero de DPI"])).unwrap();
    assert!(!lc.register(d));
    assert!(lc.registry().is_empty());
}

#[test]
fn edit_without_selection_warns_and_changes_nothing() {
    let (mut lc, _, _) = lifecycle();
    assert_eq!(lc.edit(), Err(LifecycleError::NoActiveRow));
    assert_eq!(lc.state(), RowState::Idle);
    assert_eq!(lc.notices().last().unwrap().level, NoticeLevel::Warning);
}

#[test]
fn picking_another_row_while_editing_is_refused() {
    let (mut lc, r1, r2) = lifecycle();
    lc.double_pick(r1).unwrap();

    assert_eq!(lc.pick(r2), Err(LifecycleError::EditInProgress));
    assert_eq!(lc.state(), RowState::EditingExisting);
    assert!(lc.page().row(r1).unwrap().is_selected());
    assert!(!lc.page().row(r2).unwrap().is_selected());

    assert_eq!(lc.pick(r1), Ok(RowState::EditingExisting));
}

#[test]
fn failed_save_keeps_row_editable_for_retry() {
    let (mut lc, r1, _) = lifecycle();
    lc.double_pick(r1).unwrap();
    lc.set_cell(1, "Ana Maria").unwrap();

    let failing = FakeStore::failing(500, "db down");
    let err = lc.save(&failing).unwrap_err();
    assert_eq!(
        err,
        LifecycleError::Persistence(PersistenceError::Http { status: 500, body: "db down".into() })
    );
    assert_eq!(lc.state(), RowState::EditingExisting);
    assert!(lc.active_row().unwrap().is_mutable(1));
    let notice = lc.drain_notices().pop().unwrap();
    assert_eq!(notice.level, NoticeLevel::Danger);
    assert!(notice.text.contains("db down"));

    let store = FakeStore::ok();
    assert_eq!(lc.save(&store).unwrap(), RowState::Idle);
    assert_eq!(lc.page().row(r1).unwrap().cell(1), Some("Ana Maria"));
}

#[test]
fn new_row_is_no_longer_new_after_save() {
    let (mut lc, _, _) = lifecycle();
    let store = FakeStore::ok();
    lc.add_to(&GridId::from(PERSONAL)).unwrap();
    let id = lc.active_row().unwrap().id();
    lc.set_cell(0, "9999").unwrap();
    lc.save(&store).unwrap();

    assert_eq!(store.calls.borrow()[0].1["nuevo"], serde_json::json!(true));
    assert!(!lc.page().row(id).unwrap().is_new());
}

#[test]
fn only_one_save_in_flight_and_cancel_waits() {
    let (mut lc, r1, r2) = lifecycle();
    lc.double_pick(r1).unwrap();

    let request = lc.begin_save().unwrap();
    assert_eq!(lc.state(), RowState::Saving);
    assert_eq!(lc.begin_save().unwrap_err(), LifecycleError::SaveInFlight);
    assert_eq!(lc.cancel(), Err(LifecycleError::SaveInFlight));
    assert_eq!(lc.pick(r2), Err(LifecycleError::SaveInFlight));
    assert_eq!(lc.set_cell(1, "x"), Err(LifecycleError::SaveInFlight));
    assert!(Control::ALL.iter().all(|c| !Enablement::for_state(lc.state()).is_enabled(*c)));

    let result = Err(PersistenceError::Network("connection reset".into()));
    assert!(lc.complete_save(request.ticket, result).is_err());
    assert_eq!(lc.state(), RowState::EditingExisting);

    assert_eq!(
        lc.complete_save(request.ticket, Ok(SaveReceipt::default())),
        Err(LifecycleError::StaleSaveTicket)
    );
}

#[test]
fn refusal_notices_dismiss_themselves() {
    let (mut lc, _, _) = lifecycle();
    lc.edit().unwrap_err();
    let posted = lc.notices().last().unwrap().posted;

    assert_eq!(lc.expire_notices(posted), 0);
    assert_eq!(lc.expire_notices(posted + NOTICE_TTL), 1);
    assert!(lc.notices().is_empty());
}

#[test]
fn save_message_is_surfaced() {
    let (mut lc, r1, _) = lifecycle();
    lc.double_pick(r1).unwrap();
    let request = lc.begin_save().unwrap();
    lc.complete_save(request.ticket, Ok(SaveReceipt { message: Some("Empleado actualizado".into()) }))
        .unwrap();
    assert_eq!(lc.drain_notices().pop().unwrap().text, "Empleado actualizado");
}

#[test]
fn typing_a_new_identifier_resyncs_the_panel() {
    let (mut lc, _, _) = lifecycle();
    lc.add_to(&GridId::from(PERSONAL)).unwrap();
    assert!(lc.panel().identifier().is_none());
    assert!(lc.panel().pending().is_none());

    lc.set_cell(0, "7777").unwrap();
    assert_eq!(lc.panel().identifier(), Some("7777"));
    assert!(lc.panel().pending().is_some());

    lc.resolve_photo(&FakePhotos(Err(LookupFailure::Network("timeout".into()))));
    assert_eq!(lc.panel().affordance(), Affordance::Upload);
    assert!(lc.notices().is_empty());
}

#[test]
fn reload_of_active_grid_while_editing_is_refused() {
    let (mut lc, r1, _) = lifecycle();
    lc.double_pick(r1).unwrap();
    assert_eq!(
        lc.load_records(&GridId::from(PERSONAL), &[]),
        Err(LifecycleError::EditInProgress)
    );
    assert!(lc.page().row(r1).is_some());
}

// ── Control binder ──────────────────────────────────────────────────

fn surface() -> ControlSurface {
    ControlSurface {
        add: Some(ControlHandle(1)),
        edit: Some(ControlHandle(2)),
        save: Some(ControlHandle(3)),
        cancel: Some(ControlHandle(4)),
    }
}

#[test]
fn binding_twice_runs_each_action_once() {
    let (mut lc, r1, _) = lifecycle();
    let store = FakeStore::ok();
    let mut binder = ControlBinder::new();
    binder.bind_surface(&surface());
    binder.bind_surface(&surface());

    lc.pick(r1).unwrap();
    assert_eq!(
        binder.activate(ControlHandle(2), &mut lc, &store),
        Activation::Dispatched { control: Control::Edit, outcome: Ok(RowState::EditingExisting) }
    );
    // A second Edit run would have been refused with a warning.
    assert!(lc.notices().is_empty());

    assert_eq!(
        binder.activate(ControlHandle(3), &mut lc, &store),
        Activation::Dispatched { control: Control::Save, outcome: Ok(RowState::Idle) }
    );
    assert_eq!(store.call_count(), 1);
}

#[test]
fn disabled_and_unbound_controls_do_nothing() {
    let (mut lc, _, _) = lifecycle();
    let store = FakeStore::ok();
    let mut binder = ControlBinder::new();
    binder.bind_surface(&surface());

    assert_eq!(binder.activate(ControlHandle(3), &mut lc, &store), Activation::Disabled(Control::Save));
    assert_eq!(binder.activate(ControlHandle(99), &mut lc, &store), Activation::Unbound);
    assert!(binder.is_enabled(ControlHandle(1), &lc));
    assert!(!binder.is_enabled(ControlHandle(2), &lc));
    assert_eq!(store.call_count(), 0);
    assert_eq!(lc.state(), RowState::Idle);
}
