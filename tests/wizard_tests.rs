use anyhow::Result;
use chrono::Utc;
use rust_decimal::Decimal;

use storefront_bot::db::Product;
use storefront_bot::wizard::{
    Rejection, Step, SubmitTarget, Submission, Transition, WizardContext, WizardInput,
};

const CATEGORIES: &[i32] = &[1, 2];

fn text(value: &str) -> WizardInput {
    WizardInput::Text(value.to_string())
}

/// Feed an input that must advance the wizard
fn advance(context: WizardContext, input: WizardInput) -> WizardContext {
    match context.handle(input, CATEGORIES) {
        Transition::Advanced(next) => next,
        other => panic!("expected the wizard to advance, got {other:?}"),
    }
}

fn complete(context: WizardContext, input: WizardInput) -> Submission {
    match context.handle(input, CATEGORIES) {
        Transition::Completed(submission) => submission,
        other => panic!("expected the wizard to complete, got {other:?}"),
    }
}

fn stored_pizza() -> Product {
    Product {
        id: 42,
        name: "Margherita".to_string(),
        description: "Tomato, mozzarella, basil".to_string(),
        price: Decimal::new(999, 2),
        image: "photo-original".to_string(),
        category_id: 2,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

/// The full create flow: name, description, category, price, photo
#[test]
fn test_create_product_flow() -> Result<()> {
    let context = WizardContext::create();
    assert_eq!(context.step, Step::Name);

    let context = advance(context, text("Margherita"));
    assert_eq!(context.step, Step::Description);
    let context = advance(context, text("Tomato, mozzarella, basil"));
    assert_eq!(context.step, Step::Category);
    let context = advance(context, WizardInput::CategorySelected(2));
    assert_eq!(context.step, Step::Price);
    let context = advance(context, text("9.99"));
    assert_eq!(context.step, Step::Image);

    let submission = complete(context, WizardInput::Photo("file-abc".to_string()));
    assert_eq!(submission.target, SubmitTarget::Create);
    assert_eq!(submission.product.name, "Margherita");
    assert_eq!(submission.product.category_id, 2);
    assert_eq!(submission.product.price, Decimal::new(999, 2));
    assert_eq!(submission.product.image, "file-abc");

    Ok(())
}

#[test]
fn test_back_from_price_returns_to_category() -> Result<()> {
    let context = advance(WizardContext::create(), text("Margherita"));
    let context = advance(context, text("Classic"));
    let context = advance(context, WizardInput::CategorySelected(1));
    assert_eq!(context.step, Step::Price);

    match context.handle(WizardInput::Back, CATEGORIES) {
        Transition::SteppedBack(previous) => {
            assert_eq!(previous.step, Step::Category);
            // Values already entered survive going back
            assert_eq!(previous.draft.name.as_deref(), Some("Margherita"));
        }
        other => panic!("expected to step back, got {other:?}"),
    }

    Ok(())
}

#[test]
fn test_back_on_first_step_is_rejected() -> Result<()> {
    let context = WizardContext::create();

    match context.handle(WizardInput::Back, CATEGORIES) {
        Transition::Rejected(same, Rejection::NoPreviousStep) => assert_eq!(same.step, Step::Name),
        other => panic!("expected NoPreviousStep, got {other:?}"),
    }

    Ok(())
}

#[test]
fn test_cancel_from_every_step() -> Result<()> {
    let mut context = WizardContext::create();
    let inputs = [
        text("Margherita"),
        text("Classic"),
        WizardInput::CategorySelected(2),
        text("5"),
    ];

    for input in inputs {
        assert_eq!(context.clone().handle(WizardInput::Cancel, CATEGORIES), Transition::Cancelled);
        context = advance(context, input);
    }
    assert_eq!(context.step, Step::Image);
    assert_eq!(context.handle(WizardInput::Cancel, CATEGORIES), Transition::Cancelled);

    Ok(())
}

#[test]
fn test_invalid_price_keeps_step() -> Result<()> {
    let context = advance(WizardContext::create(), text("Margherita"));
    let context = advance(context, text("Classic"));
    let context = advance(context, WizardInput::CategorySelected(2));

    for (input, expected) in [
        ("abc", Rejection::InvalidPrice),
        ("-1", Rejection::PriceOutOfRange),
        ("1000", Rejection::PriceOutOfRange),
    ] {
        match context.clone().handle(text(input), CATEGORIES) {
            Transition::Rejected(same, rejection) => {
                assert_eq!(rejection, expected, "{input}");
                assert_eq!(same.step, Step::Price);
            }
            other => panic!("expected a rejection for {input}, got {other:?}"),
        }
    }

    let context = advance(context, text("1e1"));
    assert_eq!(context.draft.price, Some(Decimal::new(10, 0)));

    Ok(())
}

#[test]
fn test_text_on_image_step_is_rejected() -> Result<()> {
    let mut context = WizardContext::create();
    for input in [text("Margherita"), text("Classic"), WizardInput::CategorySelected(2), text("5")] {
        context = advance(context, input);
    }

    match context.handle(text("not a photo"), CATEGORIES) {
        Transition::Rejected(same, Rejection::UnexpectedInput(Step::Image)) => {
            assert_eq!(same.step, Step::Image)
        }
        other => panic!("expected UnexpectedInput(Image), got {other:?}"),
    }

    Ok(())
}

/// Editing with "." everywhere except the price changes only the price
#[test]
fn test_edit_flow_with_skips() -> Result<()> {
    let original = stored_pizza();
    let context = WizardContext::edit(original.clone());

    let context = advance(context, text("."));
    let context = advance(context, text("."));
    let context = advance(context, text("."));
    let context = advance(context, text("12.50"));
    let submission = complete(context, text("."));

    assert_eq!(submission.target, SubmitTarget::Update(42));
    assert_eq!(submission.product.name, original.name);
    assert_eq!(submission.product.description, original.description);
    assert_eq!(submission.product.category_id, original.category_id);
    assert_eq!(submission.product.image, original.image);
    assert_eq!(submission.product.price, Decimal::new(1250, 2));

    Ok(())
}

#[test]
fn test_edit_accepts_new_photo() -> Result<()> {
    let mut context = WizardContext::edit(stored_pizza());
    for _ in 0..4 {
        context = advance(context, text("."));
    }

    let submission = complete(context, WizardInput::Photo("photo-new".to_string()));
    assert_eq!(submission.product.image, "photo-new");

    Ok(())
}

#[test]
fn test_unsupported_input_is_rejected_on_every_step() -> Result<()> {
    let valid_inputs = [
        (Step::Name, text("Margherita")),
        (Step::Description, text("Classic")),
        (Step::Category, WizardInput::CategorySelected(2)),
        (Step::Price, text("5")),
    ];

    let mut context = WizardContext::create();
    for (step, valid) in valid_inputs {
        assert_eq!(context.step, step);
        match context.clone().handle(WizardInput::Unsupported, CATEGORIES) {
            Transition::Rejected(same, Rejection::UnexpectedInput(rejected_step)) => {
                assert_eq!(rejected_step, step);
                assert_eq!(same, context);
            }
            other => panic!("expected UnexpectedInput({step:?}), got {other:?}"),
        }
        context = advance(context, valid);
    }

    assert_eq!(context.step, Step::Image);
    match context.clone().handle(WizardInput::Unsupported, CATEGORIES) {
        Transition::Rejected(same, Rejection::UnexpectedInput(Step::Image)) => assert_eq!(same, context),
        other => panic!("expected UnexpectedInput(Image), got {other:?}"),
    }

    Ok(())
}

#[test]
fn test_command_is_not_a_product_name() -> Result<()> {
    for command in ["/start", "  /cancel_all", "/help me"] {
        match WizardContext::create().handle(text(command), CATEGORIES) {
            Transition::Rejected(same, Rejection::UnexpectedInput(Step::Name)) => {
                assert_eq!(same, WizardContext::create(), "{command}")
            }
            other => panic!("expected {command} to be rejected, got {other:?}"),
        }
    }

    // A slash inside the name is fine
    let context = advance(WizardContext::create(), text("Half/half pizza"));
    assert_eq!(context.draft.name.as_deref(), Some("Half/half pizza"));

    Ok(())
}
